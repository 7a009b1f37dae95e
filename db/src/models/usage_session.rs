use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::QueryOrder;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Billing state of a session. Stored and serialized as its canonical wire
/// spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "UPPERCASE")]
pub enum PaidStatus {
    #[sea_orm(string_value = "UNPAID")]
    Unpaid,
    #[sea_orm(string_value = "PAID")]
    Paid,
}

/// One contiguous billable usage interval for a machine. Open while `end_at`
/// is null; `duration_seconds` is set exactly once, at close.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "usage_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub machine_id: String,
    pub user_name: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
    pub paid_status: PaidStatus,
    pub amount_due: Option<f64>,
    pub amount_paid: Option<f64>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::machine::Entity",
        from = "Column::MachineId",
        to = "super::machine::Column::MachineId"
    )]
    Machine,
}

impl Related<super::machine::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Machine.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Failures of the session lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session already closed")]
    AlreadyClosed,
    #[error("Session not found")]
    NotFound,
    #[error(transparent)]
    Db(#[from] DbErr),
}

/// Field-level merge for the administrative session update. `None` means
/// "leave as is"; this endpoint carries no state-machine semantics.
#[derive(Debug, Default)]
pub struct SessionUpdate {
    pub user_name: Option<String>,
    pub paid_status: Option<PaidStatus>,
    pub amount_due: Option<f64>,
    pub amount_paid: Option<f64>,
    pub notes: Option<String>,
}

/// Optional filters for the session history listing.
#[derive(Debug, Default)]
pub struct SessionFilter {
    pub paid_status: Option<PaidStatus>,
    pub machine_id: Option<String>,
    pub user: Option<String>,
    pub start_from: Option<DateTime<Utc>>,
    pub start_to: Option<DateTime<Utc>>,
}

impl Model {
    /// Opens a new UNPAID session with all billing fields unset.
    pub async fn open<C: ConnectionTrait>(
        db: &C,
        machine_id: &str,
        start_at: DateTime<Utc>,
    ) -> Result<Self, DbErr> {
        let row = ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            machine_id: Set(machine_id.to_string()),
            user_name: Set(None),
            start_at: Set(start_at),
            end_at: Set(None),
            duration_seconds: Set(None),
            paid_status: Set(PaidStatus::Unpaid),
            amount_due: Set(None),
            amount_paid: Set(None),
            notes: Set(None),
        };
        row.insert(db).await
    }

    /// The machine's currently open session, if any.
    pub async fn find_open_for<C: ConnectionTrait>(db: &C, machine_id: &str) -> Result<Option<Self>, DbErr> {
        Entity::find()
            .filter(Column::MachineId.eq(machine_id))
            .filter(Column::EndAt.is_null())
            .one(db)
            .await
    }

    pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: i64) -> Result<Option<Self>, DbErr> {
        Entity::find_by_id(id).one(db).await
    }

    /// Closes this session at `end_at`, computing the whole-second duration.
    ///
    /// Rejects a session whose end is already set; the record is left
    /// untouched in that case. A duration that would come out negative (clock
    /// skew between reporter and closer) is clamped to zero.
    pub async fn close<C: ConnectionTrait>(self, db: &C, end_at: DateTime<Utc>) -> Result<Self, SessionError> {
        if self.end_at.is_some() {
            return Err(SessionError::AlreadyClosed);
        }
        let duration = (end_at - self.start_at).num_seconds().max(0);
        let mut row: ActiveModel = self.into();
        row.end_at = Set(Some(end_at));
        row.duration_seconds = Set(Some(duration));
        Ok(row.update(db).await?)
    }

    /// Applies the provided billing/user fields, leaving the rest untouched.
    pub async fn merge_update<C: ConnectionTrait>(
        self,
        db: &C,
        update: SessionUpdate,
    ) -> Result<Self, DbErr> {
        let mut row: ActiveModel = self.into();
        if let Some(user_name) = update.user_name {
            row.user_name = Set(Some(user_name));
        }
        if let Some(paid_status) = update.paid_status {
            row.paid_status = Set(paid_status);
        }
        if let Some(amount_due) = update.amount_due {
            row.amount_due = Set(Some(amount_due));
        }
        if let Some(amount_paid) = update.amount_paid {
            row.amount_paid = Set(Some(amount_paid));
        }
        if let Some(notes) = update.notes {
            row.notes = Set(Some(notes));
        }
        row.update(db).await
    }

    /// Session history, newest first, with optional filters.
    pub async fn list<C: ConnectionTrait>(db: &C, filter: &SessionFilter) -> Result<Vec<Self>, DbErr> {
        let mut query = Entity::find();
        if let Some(paid) = filter.paid_status {
            query = query.filter(Column::PaidStatus.eq(paid));
        }
        if let Some(ref machine_id) = filter.machine_id {
            query = query.filter(Column::MachineId.eq(machine_id.as_str()));
        }
        if let Some(ref user) = filter.user {
            query = query.filter(Column::UserName.contains(user.as_str()));
        }
        if let Some(from) = filter.start_from {
            query = query.filter(Column::StartAt.gte(from));
        }
        if let Some(to) = filter.start_to {
            query = query.filter(Column::StartAt.lte(to));
        }
        query.order_by_desc(Column::StartAt).all(db).await
    }
}
