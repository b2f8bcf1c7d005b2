//! Rooms source (chats database)
//!
//! One row per customer conversation. Metric aggregations read the
//! per-room metrics table.

use crate::error::QueryError;
use crate::query::filter::FilterExpr;
use crate::query::{FilterField, FilterSet, PostgresFilterStrategy, SqlQuery, SqlQueryBuilder};

use super::{Operation, QueryOptions};

const QUEUE_JOIN: (&str, &str) = (
    "q",
    "INNER JOIN public.queues_queue q ON q.uuid = r.queue_id",
);
const SECTOR_JOIN: (&str, &str) = (
    "sec",
    "INNER JOIN public.sectors_sector sec ON sec.uuid = q.sector_id",
);
const TAGS_JOIN: (&str, &str) = (
    "tg",
    "INNER JOIN public.rooms_room_tags tg ON tg.room_id = r.uuid",
);
const METRICS_JOIN: (&str, &str) = (
    "mt",
    "INNER JOIN public.dashboard_roommetrics mt ON mt.room_id = r.uuid",
);

pub static ROOM_FILTERS: FilterSet = FilterSet {
    source: "rooms",
    fields: &[
        (
            "project",
            FilterField::joined("sec", "project_id", &[QUEUE_JOIN, SECTOR_JOIN]).uuid(),
        ),
        (
            "sector",
            FilterField::joined("sec", "uuid", &[QUEUE_JOIN, SECTOR_JOIN]).uuid(),
        ),
        ("queue", FilterField::column("r", "queue_id").uuid()),
        ("agent", FilterField::column("r", "user_id")),
        ("user_id", FilterField::column("r", "user_id")),
        ("contact", FilterField::column("r", "contact_id").uuid()),
        ("tags", FilterField::joined("tg", "sectortag_id", &[TAGS_JOIN]).uuid()),
        ("created_on", FilterField::column("r", "created_on").timestamp()),
        ("ended_at", FilterField::column("r", "ended_at").timestamp()),
        ("is_active", FilterField::column("r", "is_active")),
        ("urn", FilterField::column("r", "urn")),
        ("user", FilterField::column("r", "user_id")),
    ],
};

/// Columns of the metrics table that can be summed or averaged
pub const METRIC_FIELDS: &[&str] = &[
    "waiting_time",
    "first_response_time",
    "message_response_time",
    "interaction_time",
];

const LIST_COLUMNS: &[&str] = &[
    "r.uuid",
    "r.created_on",
    "r.ended_at",
    "r.is_active",
    "r.user_id AS agent",
    "r.contact_id AS contact",
    "r.queue_id AS queue",
    "r.urn",
];

pub fn build_query(
    filters: &[FilterExpr],
    operation: Operation,
    options: &QueryOptions,
) -> Result<SqlQuery, QueryError> {
    let mut builder = SqlQueryBuilder::new("public.rooms_room", "r", "uuid");
    ROOM_FILTERS.apply_sql(&mut builder, &PostgresFilterStrategy, filters)?;

    match operation {
        Operation::Count => {
            builder.build_query();
            builder.count()
        }
        Operation::List => {
            builder.build_query();
            // One extra row tells the caller whether another page exists
            builder.list(
                LIST_COLUMNS,
                "r.created_on DESC",
                options.limit + 1,
                options.offset,
            )
        }
        Operation::TimeseriesHourGroupCount => {
            builder.build_query();
            builder.timeseries_hour_group_count("created_on", &options.timezone)
        }
        Operation::Sum | Operation::Avg => {
            let field = options.require_op_field(operation)?;
            if !METRIC_FIELDS.contains(&field) {
                return Err(QueryError::InvalidFilter {
                    field: "op_field".to_string(),
                    reason: format!("'{}' is not a room metric", field),
                });
            }
            builder.add_join(METRICS_JOIN.0, METRICS_JOIN.1);
            builder.build_query();

            let expr = format!("mt.{}", field);
            if operation == Operation::Sum {
                builder.sum(&expr)
            } else {
                builder.avg(&expr)
            }
        }
        Operation::Recurrence => Err(QueryError::UnsupportedOperation(format!(
            "{} on rooms",
            operation
        ))),
    }
}
