use sea_orm::entity::prelude::*;
use time::OffsetDateTime;

/// One accepted telemetry event. Column order after `id` is part of the
/// external contract and must not change.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "pointdata")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub timestamp: Option<String>,
    pub received_at: OffsetDateTime,
    pub system: Option<String>,
    pub username: Option<String>,
    pub remote_ip: Option<String>,
    pub server_ip: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub data: Option<String>,
    pub tzinfo: Option<String>,
    pub is_utc: i16,
}

impl ActiveModelBehavior for ActiveModel {}
