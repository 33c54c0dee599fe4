pub mod events;

use super::{Module, ModuleDefinition};

pub fn module() -> Module {
    Module {
        definition: ModuleDefinition {
            id: "logging",
            name: "Moderation Logging",
            description: "Forwards guild moderation events to the configured log channel",
        },
        commands: vec![],
        event_handlers: events::handlers(),
    }
}
