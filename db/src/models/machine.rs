use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Presence of a machine as last asserted by its events, or overridden by the
/// staleness reconciler. Stored and serialized as its canonical wire spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    #[sea_orm(string_value = "ONLINE")]
    Online,
    #[sea_orm(string_value = "OFFLINE")]
    Offline,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Online => "ONLINE",
            Status::Offline => "OFFLINE",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "machines")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Stable, caller-supplied fleet identity.
    #[sea_orm(unique)]
    pub machine_id: String,
    /// Opaque UUID identifying the reporting process/install.
    #[sea_orm(unique)]
    pub client_instance_id: String,
    pub last_seen_at: DateTime<Utc>,
    pub status: Status,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::usage_session::Entity")]
    Sessions,
}

impl Related<super::usage_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Materializes a machine on its first event, OFFLINE until the event's
    /// transition is applied.
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        machine_id: &str,
        client_instance_id: &str,
        last_seen_at: DateTime<Utc>,
    ) -> Result<Self, DbErr> {
        let row = ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            machine_id: Set(machine_id.to_string()),
            client_instance_id: Set(client_instance_id.to_string()),
            last_seen_at: Set(last_seen_at),
            status: Set(Status::Offline),
        };
        row.insert(db).await
    }

    pub async fn find_by_machine_id<C: ConnectionTrait>(db: &C, machine_id: &str) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::MachineId.eq(machine_id))
            .one(db)
            .await
    }

    /// Writes a new presence assertion for this machine.
    pub async fn set_presence<C: ConnectionTrait>(
        self,
        db: &C,
        status: Status,
        last_seen_at: DateTime<Utc>,
    ) -> Result<Self, DbErr> {
        let mut row: ActiveModel = self.into();
        row.status = Set(status);
        row.last_seen_at = Set(last_seen_at);
        row.update(db).await
    }

    /// All machines, ordered by `machine_id` for deterministic output.
    pub async fn all_ordered<C: ConnectionTrait>(db: &C) -> Result<Vec<Self>, DbErr> {
        use sea_orm::QueryOrder;
        Entity::find()
            .order_by_asc(Column::MachineId)
            .all(db)
            .await
    }

    /// Machines still marked ONLINE whose last report predates `threshold`.
    pub async fn find_stale<C: ConnectionTrait>(
        db: &C,
        threshold: DateTime<Utc>,
    ) -> Result<Vec<Self>, DbErr> {
        Entity::find()
            .filter(Column::Status.eq(Status::Online))
            .filter(Column::LastSeenAt.lt(threshold))
            .all(db)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 10, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn create_defaults_to_offline() {
        let db = setup_test_db().await;
        let m = Model::create(&db, "pc-01", "uuid-1", t0()).await.unwrap();
        assert_eq!(m.status, Status::Offline);
        assert_eq!(m.last_seen_at, t0());
    }

    #[tokio::test]
    async fn set_presence_updates_status_and_last_seen() {
        let db = setup_test_db().await;
        let m = Model::create(&db, "pc-01", "uuid-1", t0()).await.unwrap();
        let later = t0() + chrono::Duration::seconds(30);
        let m = m.set_presence(&db, Status::Online, later).await.unwrap();
        assert_eq!(m.status, Status::Online);
        assert_eq!(m.last_seen_at, later);
    }

    #[tokio::test]
    async fn find_stale_only_returns_online_machines_past_threshold() {
        let db = setup_test_db().await;
        let a = Model::create(&db, "pc-a", "uuid-a", t0()).await.unwrap();
        a.set_presence(&db, Status::Online, t0()).await.unwrap();
        let b = Model::create(&db, "pc-b", "uuid-b", t0()).await.unwrap();
        b.set_presence(&db, Status::Online, t0() + chrono::Duration::seconds(600))
            .await
            .unwrap();
        // OFFLINE machine past the threshold must not be reported.
        Model::create(&db, "pc-c", "uuid-c", t0()).await.unwrap();

        let threshold = t0() + chrono::Duration::seconds(120);
        let stale = Model::find_stale(&db, threshold).await.unwrap();
        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].machine_id, "pc-a");
    }

    #[tokio::test]
    async fn all_ordered_sorts_by_machine_id() {
        let db = setup_test_db().await;
        Model::create(&db, "pc-02", "uuid-2", t0()).await.unwrap();
        Model::create(&db, "pc-01", "uuid-1", t0()).await.unwrap();
        let all = Model::all_ordered(&db).await.unwrap();
        let ids: Vec<_> = all.iter().map(|m| m.machine_id.as_str()).collect();
        assert_eq!(ids, vec!["pc-01", "pc-02"]);
    }
}
