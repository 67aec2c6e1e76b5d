use serde::Deserialize;

use crate::domain::ticket::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Technician {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
}

/// Resolves assignee ids to display names.
#[derive(Debug, Clone, Default)]
pub struct TechnicianDirectory {
    technicians: Vec<Technician>,
}

impl TechnicianDirectory {
    pub fn new(technicians: Vec<Technician>) -> Self {
        Self { technicians }
    }

    pub fn technicians(&self) -> &[Technician] {
        &self.technicians
    }

    pub fn find(&self, id: &UserId) -> Option<&Technician> {
        self.technicians.iter().find(|tech| &tech.id == id)
    }

    pub fn name_of(&self, id: Option<&UserId>) -> &str {
        match UserId::normalize(id.cloned()) {
            None => "Unassigned",
            Some(id) => self
                .find(&id)
                .map(|tech| tech.name.as_str())
                .unwrap_or("Unknown"),
        }
    }
}
