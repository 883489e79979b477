use modmenu_core::{ExtensionRecord, ModMenu, ModMenuConfig, Registry};
use std::sync::Arc;

fn names(registry: &Registry) -> Vec<String> {
    registry.iter().map(|record| record.name().to_string()).collect()
}

fn expected_order(inserted: &[&str]) -> Vec<String> {
    let mut expected: Vec<String> = inserted.iter().map(|name| name.to_string()).collect();
    expected.sort_by_key(|name| name.to_uppercase());
    expected
}

#[test]
fn iteration_order_is_case_insensitive_for_any_insertion_order() {
    let pool = [
        "zeta", "Alpha", "beta", "ALPHA", "Gamma", "delta", "", "Beta", "epsilon", "alpha",
    ];
    // Walk a handful of deterministic permutations of the pool.
    let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
    for _ in 0..25 {
        let mut order: Vec<&str> = pool.to_vec();
        for index in (1..order.len()).rev() {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            order.swap(index, (seed % (index as u64 + 1)) as usize);
        }

        let mut registry = Registry::new();
        for name in &order {
            registry.add(ExtensionRecord::new(*name, || {}));
        }
        assert_eq!(names(&registry), expected_order(&order));
    }
}

#[test]
fn equal_names_keep_insertion_order() {
    let mut registry = Registry::new();
    let tags = Arc::new(std::sync::Mutex::new(Vec::new()));
    for (name, tag) in [("tools", 1), ("Tools", 2), ("alpha", 3), ("TOOLS", 4)] {
        let tags = Arc::clone(&tags);
        registry.add(ExtensionRecord::new(name, move || {
            tags.lock().expect("tags lock").push(tag);
        }));
    }

    assert_eq!(names(&registry), vec!["alpha", "tools", "Tools", "TOOLS"]);
    for record in &registry {
        record.render();
    }
    assert_eq!(*tags.lock().expect("tags lock"), vec![3, 1, 2, 4]);
}

#[test]
fn empty_and_duplicate_names_are_accepted() {
    let menu = ModMenu::new(ModMenuConfig::default()).expect("default config");
    menu.add_entry("Tools", || {});
    menu.add_entry("", || {});
    menu.add_entry("Tools", || {});

    assert_eq!(menu.entry_names(), vec!["", "Tools", "Tools"]);
    assert_eq!(menu.entries().len(), 3);
}

#[test]
fn direct_registration_merges_with_discovered_entries() {
    let menu = ModMenu::new(ModMenuConfig::default()).expect("default config");
    menu.add_entry("zoom", || {});
    menu.initialize();
    menu.add_entry("Audio", || {});

    assert_eq!(menu.entry_names(), vec!["Audio", "zoom"]);
}
