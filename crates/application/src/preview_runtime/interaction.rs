use appdeck_domain::ComponentKind;

use super::*;

impl PreviewRuntime {
    /// Stores one form field value.
    pub fn set_form_value(&mut self, field_id: impl Into<String>, value: Value) {
        self.state.form.set(field_id, value);
    }

    /// Dispatches one root action against the current document.
    pub async fn dispatch(&mut self, action: &Action) -> AppResult<()> {
        let Some(document) = self.history.as_ref().map(History::present) else {
            return Err(missing_document(self.app_instance_id));
        };

        self.state.dispatch_generation = self.state.dispatch_generation.wrapping_add(1);
        self.dispatcher
            .dispatch(
                action,
                DispatchScope::new(self.app_instance_id, document),
                &mut self.state,
            )
            .await
    }

    /// Takes the api submits queued by earlier dispatches.
    pub fn take_api_submits(&mut self) -> Vec<PendingApiSubmit> {
        std::mem::take(&mut self.state.pending_api_submits)
    }

    /// Applies the outcome of an api submit sent outside the runtime lock.
    pub async fn complete_api_submit(
        &mut self,
        submit: PendingApiSubmit,
        succeeded: bool,
    ) -> AppResult<()> {
        let Some(document) = self.history.as_ref().map(History::present) else {
            debug!(app_instance_id = %self.app_instance_id, "api submit outcome dropped without a document");
            return Ok(());
        };

        self.dispatcher
            .complete_api_submit(
                submit,
                succeeded,
                DispatchScope::new(self.app_instance_id, document),
                &mut self.state,
            )
            .await
    }

    /// Presses a component of the current screen.
    ///
    /// `item_id` selects the record of the enclosing list; it is required for
    /// components rendered inside a list bound to a table.
    pub async fn press_component(
        &mut self,
        component_id: &str,
        item_id: Option<&str>,
    ) -> AppResult<()> {
        let ScreenResolution::Screen(screen_id) = self.resolution() else {
            return Err(AppError::Conflict(format!(
                "component '{component_id}' cannot be pressed while no screen is shown"
            )));
        };
        let Some(document) = self.history.as_ref().map(History::present) else {
            return Err(missing_document(self.app_instance_id));
        };

        let path = document
            .screen(screen_id.as_str())
            .and_then(|screen| screen.component_path(component_id))
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "component '{component_id}' does not exist on screen '{screen_id}'"
                ))
            })?;
        let Some(component) = path.last() else {
            return Ok(());
        };
        let Some(action) = component.action() else {
            debug!(component_id, "pressed component has no action");
            return Ok(());
        };

        let list_table = path
            .iter()
            .rev()
            .skip(1)
            .filter(|ancestor| ancestor.kind() == &ComponentKind::List)
            .find_map(|ancestor| ancestor.data_source());
        let item = match (list_table, item_id) {
            (Some(table), Some(item_id)) => {
                let record = self
                    .dispatcher
                    .data_store()
                    .get_table(self.app_instance_id, table)
                    .await?
                    .into_iter()
                    .find(|record| record.id() == item_id)
                    .ok_or_else(|| {
                        AppError::NotFound(format!(
                            "record '{item_id}' does not exist in table '{table}'"
                        ))
                    })?;
                Some(record)
            }
            (Some(table), None) => {
                return Err(AppError::Validation(format!(
                    "component '{component_id}' is rendered per record of '{table}' and requires an item id"
                )));
            }
            (None, _) => None,
        };

        self.state.dispatch_generation = self.state.dispatch_generation.wrapping_add(1);
        self.dispatcher
            .dispatch(
                action,
                DispatchScope::new(self.app_instance_id, document).with_item(item.as_ref()),
                &mut self.state,
            )
            .await
    }

    /// Presses one popup button, closing the popup and dispatching its action.
    ///
    /// A popup without custom buttons has a single implicit dismiss button.
    pub async fn press_popup_button(&mut self, index: usize) -> AppResult<()> {
        let popup = self
            .state
            .popup
            .as_ref()
            .ok_or_else(|| AppError::NotFound("no popup is open".to_owned()))?;
        if popup.buttons().is_empty() && index == 0 {
            self.state.popup = None;
            return Ok(());
        }
        let button = popup.buttons().get(index).ok_or_else(|| {
            AppError::NotFound(format!("popup button {index} does not exist"))
        })?;

        let action = button.action.as_deref().cloned();
        self.state.popup = None;

        match action {
            Some(action) => self.dispatch(&action).await,
            None => Ok(()),
        }
    }

    /// Closes the popup and reports whether one was open.
    pub fn dismiss_popup(&mut self) -> bool {
        self.state.popup.take().is_some()
    }
}
