#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use modstack::{Attrs, CreateOptions, ModalId, ModalService, SimpleContent};

#[derive(Arbitrary, Debug)]
enum Op {
    Create { container: u8 },
    Remove { container: u8, pick: u8 },
    RemoveUnknown { container: u8 },
}

const CONTAINERS: [&str; 3] = ["main", "side", "toast"];

fuzz_target!(|ops: Vec<Op>| {
    let service = ModalService::default();
    let mut model: Vec<Vec<ModalId>> = vec![Vec::new(); CONTAINERS.len()];

    for op in ops.into_iter().take(256) {
        match op {
            Op::Create { container } => {
                let slot = usize::from(container) % CONTAINERS.len();
                let id = service.create(
                    SimpleContent::new("fuzz"),
                    Attrs::new(),
                    CreateOptions::new().container(CONTAINERS[slot]),
                );
                model[slot].push(id);
            }
            Op::Remove { container, pick } => {
                let slot = usize::from(container) % CONTAINERS.len();
                let ids = &mut model[slot];
                if ids.is_empty() {
                    continue;
                }
                let id = ids.remove(usize::from(pick) % ids.len());
                assert!(service.registry().remove_modal(CONTAINERS[slot], &id));
                assert!(!service.registry().remove_modal(CONTAINERS[slot], &id));
            }
            Op::RemoveUnknown { container } => {
                let slot = usize::from(container) % CONTAINERS.len();
                let before = service.registry().snapshot(CONTAINERS[slot]);
                assert!(!service.registry().remove_modal(CONTAINERS[slot], &ModalId::generate()));
                assert_eq!(service.registry().snapshot(CONTAINERS[slot]), before);
            }
        }

        for (slot, name) in CONTAINERS.iter().enumerate() {
            let stack = service.registry().snapshot(name);
            let ids: Vec<&ModalId> = stack.iter().map(|d| d.identifier()).collect();
            assert_eq!(ids, model[slot].iter().collect::<Vec<_>>());
            assert_eq!(
                stack.top().map(|d| d.identifier()),
                model[slot].last()
            );
        }
    }
});
