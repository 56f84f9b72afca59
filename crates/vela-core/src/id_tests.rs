// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn container_id_compares_against_str() {
    let id = ContainerId::new("step-1");
    assert_eq!(id, "step-1");
    assert_eq!(id.as_str(), "step-1");
    assert_eq!(id.to_string(), "step-1");
}

#[test]
fn container_id_usable_as_hashmap_key() {
    use std::collections::HashMap;
    let mut map: HashMap<ContainerId, u32> = HashMap::new();
    map.insert(ContainerId::new("a"), 1);
    assert_eq!(map.get("a"), Some(&1));
}
