use serde::Deserialize;

use crate::domain::status::NewLeadStatus;
use crate::domain::types::{HexColor, StatusLabel};
use crate::forms::FormError;

#[derive(Debug, Deserialize)]
pub struct CreateStatusForm {
    pub label: String,
    pub hex_color: String,
    #[serde(default)]
    pub order_index: i32,
}

impl TryFrom<CreateStatusForm> for NewLeadStatus {
    type Error = FormError;

    fn try_from(form: CreateStatusForm) -> Result<Self, Self::Error> {
        Ok(NewLeadStatus {
            label: StatusLabel::new(form.label).map_err(|_| FormError::InvalidStatus)?,
            hex_color: HexColor::new(form.hex_color).map_err(|_| FormError::InvalidColor)?,
            order_index: form.order_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_is_validated() {
        let form = CreateStatusForm {
            label: "Hot".to_string(),
            hex_color: "red".to_string(),
            order_index: 3,
        };
        assert!(matches!(
            NewLeadStatus::try_from(form),
            Err(FormError::InvalidColor)
        ));
    }
}
