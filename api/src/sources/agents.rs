//! Agents source (chats database)
//!
//! Agents are project permissions joined to their user, with counters of
//! the rooms they hold inside the same project.

use crate::error::QueryError;
use crate::query::filter::FilterExpr;
use crate::query::{FilterField, FilterSet, PostgresFilterStrategy, SqlQuery, SqlQueryBuilder};

use super::{Operation, QueryOptions};

pub static AGENT_FILTERS: FilterSet = FilterSet {
    source: "agents",
    fields: &[
        ("project", FilterField::column("pp", "project_id").uuid()),
        ("agent", FilterField::column("pp", "user_id")),
        ("email", FilterField::column("pp", "user_id")),
        ("role", FilterField::column("pp", "role")),
        ("status", FilterField::column("pp", "status")),
    ],
};

const USER_JOIN: (&str, &str) = (
    "u",
    "INNER JOIN public.accounts_user u ON u.email = pp.user_id",
);

// Rooms are restricted to queues of the permission's own project
const ROOMS_JOIN: (&str, &str) = (
    "r",
    "LEFT JOIN public.rooms_room r ON r.user_id = pp.user_id AND r.queue_id IN (\
     SELECT q.uuid FROM public.queues_queue q \
     INNER JOIN public.sectors_sector sec ON sec.uuid = q.sector_id \
     WHERE sec.project_id = pp.project_id)",
);

const LIST_SELECT: &str = "pp.user_id AS agent, u.first_name, u.last_name, pp.status, \
     COUNT(DISTINCT r.uuid) FILTER (WHERE r.is_active) AS opened_rooms, \
     COUNT(DISTINCT r.uuid) FILTER (WHERE NOT r.is_active) AS closed_rooms";

const LIST_GROUP_BY: &str = "pp.user_id, u.first_name, u.last_name, pp.status";

pub fn build_query(
    filters: &[FilterExpr],
    operation: Operation,
    options: &QueryOptions,
) -> Result<SqlQuery, QueryError> {
    let mut builder = SqlQueryBuilder::new("public.projects_projectpermission", "pp", "uuid");
    AGENT_FILTERS.apply_sql(&mut builder, &PostgresFilterStrategy, filters)?;

    match operation {
        Operation::Count => {
            builder.build_query();
            builder.count()
        }
        Operation::List => {
            builder.add_join(USER_JOIN.0, USER_JOIN.1);
            builder.add_join(ROOMS_JOIN.0, ROOMS_JOIN.1);
            builder.build_query();
            builder.select(
                "list",
                LIST_SELECT,
                Vec::new(),
                Some(LIST_GROUP_BY),
                Some("pp.user_id"),
                Some((options.limit + 1, options.offset)),
            )
        }
        _ => Err(QueryError::UnsupportedOperation(format!(
            "{} on agents",
            operation
        ))),
    }
}
