use crate::alert::Alert;
use crate::dashboard::{Dashboard, Form, Region};
use crate::errors::FormError;
use crate::models::NewContestant;
use crate::render;

/// Raw values of `#contestantForm`.
#[derive(Clone, Debug, Default)]
pub struct ContestantForm {
    pub name: String,
    pub email: String,
}

impl ContestantForm {
    pub fn parse(&self) -> Result<NewContestant, FormError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(FormError::Missing("name"));
        }
        let email = self.email.trim();
        if email.is_empty() {
            return Err(FormError::Missing("email"));
        }
        Ok(NewContestant {
            name: name.to_string(),
            email: email.to_string(),
        })
    }
}

impl Dashboard {
    /// Renders the table and rebuilds every contestant select on the page.
    pub async fn load_contestants(&self) {
        match self.api.list_contestants().await {
            Ok(contestants) => {
                self.view.render(
                    Region::ContestantsList,
                    &render::contestants_table(&contestants),
                );
                let selected = self.session.remembered_contestant();
                self.view.render(
                    Region::ContestantSelects,
                    &render::contestant_options(&contestants, selected),
                );
            }
            Err(err) => self
                .view
                .show(Alert::danger(err.alert_message("Failed to load contestants"))),
        }
    }

    pub async fn create_contestant(&self, form: ContestantForm) {
        let contestant = match form.parse() {
            Ok(contestant) => contestant,
            Err(err) => {
                self.view.show(Alert::danger(err.to_string()));
                return;
            }
        };
        match self.api.create_contestant(&contestant).await {
            Ok(_) => {
                self.view
                    .show(Alert::success("Contestant created successfully!"));
                self.view.reset_form(Form::Contestant);
                self.load_contestants().await;
            }
            Err(err) => self
                .view
                .show(Alert::danger(err.alert_message("Failed to create contestant"))),
        }
    }

    pub async fn delete_contestant(&self, contestant_id: i64) {
        if !self
            .view
            .confirm("Are you sure you want to delete this contestant?")
        {
            return;
        }
        match self.api.delete_contestant(contestant_id).await {
            Ok(_) => {
                self.view
                    .show(Alert::success("Contestant deleted successfully"));
                self.load_contestants().await;
            }
            Err(err) => self
                .view
                .show(Alert::danger(err.alert_message("Failed to delete contestant"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_requires_both_fields() {
        let form = ContestantForm {
            name: "  Dana ".to_string(),
            email: " dana@example.com".to_string(),
        };
        assert_eq!(
            form.parse(),
            Ok(NewContestant {
                name: "Dana".to_string(),
                email: "dana@example.com".to_string(),
            })
        );

        let form = ContestantForm {
            name: "Dana".to_string(),
            email: "   ".to_string(),
        };
        assert_eq!(form.parse(), Err(FormError::Missing("email")));
    }
}
