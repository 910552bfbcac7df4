use serde::Deserialize;

use crate::domain::types::NoteContent;
use crate::forms::FormError;

#[derive(Debug, Deserialize)]
pub struct AddNoteForm {
    pub content: String,
}

impl TryFrom<AddNoteForm> for NoteContent {
    type Error = FormError;

    fn try_from(form: AddNoteForm) -> Result<Self, Self::Error> {
        NoteContent::new(form.content).map_err(|_| FormError::EmptyContent)
    }
}
