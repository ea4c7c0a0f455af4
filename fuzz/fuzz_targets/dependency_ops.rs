#![no_main]

use libfuzzer_sys::fuzz_target;
use ferrous_kit::error::BoxError;
use ferrous_kit::{Dependency, Dispose, Lifetime, Recipe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

struct Probe {
    id: u8,
    releases: AtomicU32,
}

impl Probe {
    fn new(id: u8) -> Self {
        Self { id, releases: AtomicU32::new(0) }
    }
}

impl Dispose for Probe {
    fn dispose(&self) -> Result<(), BoxError> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fuzz_target!(|data: &[u8]| {
    let Some((&flags, ops)) = data.split_first() else {
        return;
    };

    let mut dep = Dependency::from_recipe(Recipe::from_fn(|| Probe::new(0)), Lifetime::from(flags & 1 == 0));
    let mut overrides: Vec<(Arc<Probe>, bool)> = Vec::new();
    let mut current: Option<Arc<Probe>> = None;

    for &byte in ops {
        match byte % 5 {
            0 => {
                let resolved = dep.resolve().unwrap();
                match &current {
                    Some(expected) => assert!(Arc::ptr_eq(&resolved, expected)),
                    None => assert_eq!(resolved.id, 0),
                }
            }
            1 | 2 => {
                let disposable = byte % 5 == 1;
                let probe = Arc::new(Probe::new(byte | 1));
                if disposable {
                    dep.inject_disposable(probe.clone()).unwrap();
                } else {
                    dep.inject(probe.clone()).unwrap();
                }
                overrides.push((probe.clone(), disposable));
                current = Some(probe);
            }
            3 => {
                dep.clear_injected().unwrap();
                current = None;
            }
            _ => {
                let mut scope = dep.scope();
                let _ = scope.resolve().unwrap();
                drop(scope);
                current = None;
            }
        }
    }

    drop(dep);

    // Every disposable override released exactly once, plain ones never
    for (probe, disposable) in overrides {
        let expected = if disposable { 1 } else { 0 };
        assert_eq!(probe.releases.load(Ordering::SeqCst), expected);
    }
});
