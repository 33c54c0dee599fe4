pub mod commands;

use super::{Module, ModuleDefinition};

pub fn module() -> Module {
    Module {
        definition: ModuleDefinition {
            id: "dashboard",
            name: "Dashboard",
            description: "Links server admins to the web dashboard",
        },
        commands: commands::commands(),
        event_handlers: vec![],
    }
}
