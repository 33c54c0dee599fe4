use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-guild dashboard settings. The dashboard writes this table; the bot
/// only reads it. Toggle columns mirror the dashboard schema: integer 0/1
/// with 1 as the column default.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Eq)]
#[sea_orm(table_name = "guild_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub guild_id: i64,
    pub log_channel_id: String,
    pub log_join: i32,
    pub log_invites: i32,
    pub log_nickname: i32,
    pub log_roles: i32,
    pub log_message_edit: i32,
    pub log_message_delete: i32,
    pub log_ban: i32,
    pub log_kick: i32,
    pub log_timeout: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
