use diesel::prelude::*;

use crate::domain::status::{LeadStatus as DomainLeadStatus, NewLeadStatus as DomainNewLeadStatus};
use crate::domain::types::{HexColor, StatusId, StatusLabel, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::lead_statuses)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LeadStatus {
    pub id: i32,
    pub label: String,
    pub hex_color: String,
    pub order_index: i32,
    pub is_active: bool,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::lead_statuses)]
pub struct NewLeadStatus<'a> {
    pub label: &'a str,
    pub hex_color: &'a str,
    pub order_index: i32,
}

impl TryFrom<LeadStatus> for DomainLeadStatus {
    type Error = TypeConstraintError;

    fn try_from(status: LeadStatus) -> Result<Self, Self::Error> {
        Ok(Self {
            id: StatusId::try_from(status.id)?,
            label: StatusLabel::new(status.label)?,
            hex_color: HexColor::new(status.hex_color)?,
            order_index: status.order_index,
            is_active: status.is_active,
        })
    }
}

impl<'a> From<&'a DomainNewLeadStatus> for NewLeadStatus<'a> {
    fn from(status: &'a DomainNewLeadStatus) -> Self {
        Self {
            label: status.label.as_str(),
            hex_color: status.hex_color.as_str(),
            order_index: status.order_index,
        }
    }
}
