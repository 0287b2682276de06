//! Notes kept about customers

use crate::database::{queries, CustomerNote};
use crate::error::Result;
use super::Code;
use super::tracker::Tracker;

impl Tracker {
    /// Add a note for a customer of a project
    pub fn insert_note(&self, prj_id: i64, customer_id: &str, note: &str) -> Code {
        self.code_for(
            queries::insert_customer_note(self.db(), prj_id, customer_id, note),
            "add customer note",
        )
    }

    /// Replace a note's project, customer and text
    pub fn update_note(&self, cno_id: i64, prj_id: i64, customer_id: &str, note: &str) -> Code {
        self.code_for(
            queries::update_customer_note(self.db(), cno_id, prj_id, customer_id, note),
            "update customer note",
        )
    }

    /// Delete notes by ID
    pub fn remove_notes(&self, cno_ids: &[i64]) -> Code {
        self.code_for(queries::delete_customer_notes(self.db(), cno_ids), "remove customer notes")
    }

    pub fn note_details(&self, cno_id: i64) -> Result<Option<CustomerNote>> {
        queries::get_customer_note(self.db(), cno_id)
    }

    pub fn note_details_by_customer(&self, prj_id: i64, customer_id: &str) -> Result<Option<CustomerNote>> {
        queries::get_customer_note_by_customer(self.db(), prj_id, customer_id)
    }

    /// All notes with their project titles
    pub fn note_list(&self) -> Result<Vec<CustomerNote>> {
        queries::get_customer_notes(self.db())
    }
}
