use chrono::{DateTime, Utc};

use crate::model::ids::{CourseId, TransactionId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    Purchase,
    Refund,
    Payout,
    Adjustment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
    Cancelled,
}

/// Read-only reporting entity: a money movement tied to a user and course.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub kind: TransactionKind,
    pub status: TransactionStatus,
    pub amount: f64,
    pub currency: String,
    pub fee: f64,
    pub net: f64,
    pub created_at: DateTime<Utc>,
}
