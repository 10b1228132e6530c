// Copyright (c) 2026 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! In-memory hub for executor and controller tests.

use crate::client::{Item, ItemApi};
use crate::errors::ServiceError;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

#[derive(Default)]
pub(crate) struct MockHub {
    items: RefCell<HashMap<String, Item>>,
    /// Sent commands in order: (item name, value).
    pub commands: RefCell<Vec<(String, String)>>,
    /// Number of `get_item` calls.
    pub fetches: Cell<usize>,
    /// Apply sent commands to the stored item states.
    pub apply_commands: bool,
    /// Item name to HTTP status for simulated failures.
    pub failures: HashMap<String, u16>,
    /// State updates applied after the next command, simulating a device reacting differently.
    pub after_command: RefCell<Vec<(String, String)>>,
}

impl MockHub {
    pub fn new(items: Vec<Item>) -> Self {
        let hub = Self::default();
        for item in items {
            hub.items.borrow_mut().insert(item.name.clone(), item);
        }
        hub
    }

    pub fn with_applied_commands(mut self) -> Self {
        self.apply_commands = true;
        self
    }

    pub fn with_failure(mut self, name: &str, status: u16) -> Self {
        self.failures.insert(name.into(), status);
        self
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.commands.borrow().clone()
    }

    fn set_state(&self, name: &str, value: &str) {
        for item in self.items.borrow_mut().values_mut() {
            update_state(item, name, value);
        }
    }

    fn check_failure(&self, name: &str) -> Result<(), ServiceError> {
        match self.failures.get(name) {
            Some(status) => Err(ServiceError::Http {
                status: *status,
                message: format!("Simulated failure of {name}"),
            }),
            None => Ok(()),
        }
    }
}

fn update_state(item: &mut Item, name: &str, value: &str) {
    if item.name == name {
        item.state = value.to_string();
    }
    for member in item.members.iter_mut() {
        update_state(member, name, value);
    }
}

impl ItemApi for MockHub {
    async fn get_item(&self, name: &str) -> Result<Item, ServiceError> {
        self.fetches.set(self.fetches.get() + 1);
        self.check_failure(name)?;
        self.items
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| ServiceError::Http {
                status: 404,
                message: format!("Item {name} does not exist!"),
            })
    }

    async fn get_items(&self) -> Result<Vec<Item>, ServiceError> {
        let mut items: Vec<Item> = self.items.borrow().values().cloned().collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn send_command(&self, name: &str, value: &str) -> Result<(), ServiceError> {
        self.check_failure(name)?;
        self.commands
            .borrow_mut()
            .push((name.to_string(), value.to_string()));
        if self.apply_commands {
            self.set_state(name, value);
        }
        let updates: Vec<_> = self.after_command.borrow_mut().drain(..).collect();
        for (name, value) in updates {
            self.set_state(&name, &value);
        }
        Ok(())
    }
}
