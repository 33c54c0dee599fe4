pub mod dashboard;
pub mod logging;

use crate::{Data, Error};

pub type EventHandlerFn = for<'a> fn(
    &'a poise::serenity_prelude::Context,
    &'a poise::serenity_prelude::FullEvent,
    &'a Data,
) -> poise::BoxFuture<'a, Result<(), Error>>;

#[derive(Debug, Clone)]
pub struct ModuleDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub struct Module {
    pub definition: ModuleDefinition,
    pub commands: Vec<poise::Command<Data, Error>>,
    pub event_handlers: Vec<EventHandlerFn>,
}

pub fn get_modules() -> Vec<Module> {
    vec![logging::module(), dashboard::module()]
}

pub fn commands() -> Vec<poise::Command<Data, Error>> {
    let mut all_commands = vec![];

    for mut module in get_modules() {
        let category = module.definition.id;
        for command in &mut module.commands {
            command.category = Some(category.into());
        }
        all_commands.extend(module.commands);
    }

    all_commands
}

pub fn event_handlers() -> Vec<EventHandlerFn> {
    get_modules()
        .into_iter()
        .flat_map(|module| module.event_handlers)
        .collect()
}
