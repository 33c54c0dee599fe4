pub mod invites;
pub mod members;
pub mod membership;
pub mod messages;

use crate::modules::EventHandlerFn;

pub fn handlers() -> Vec<EventHandlerFn> {
    vec![
        membership::handler,
        members::handler,
        messages::handler,
        invites::handler,
    ]
}
