// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Load arbitrary inventory JSON and trace every endpoint

#![no_main]

use cablepath::prelude::*;
use cablepath::store::Inventory;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(inventory) = serde_json::from_slice::<Inventory>(data) else {
        return;
    };
    let mut engine = CablePathEngine::new(MemoryStore::from_inventory(inventory));
    // Dangling references and loops must end as partial paths, never panic
    let _ = engine.retrace_all(true, |_, _, _| {});
});
