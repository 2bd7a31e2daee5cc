use super::*;

impl ActionDispatcher {
    pub(super) async fn submit(
        &self,
        submit: &SubmitAction,
        scope: DispatchScope<'_>,
        state: &mut RuntimeState,
        depth: usize,
    ) -> AppResult<()> {
        match submit.target {
            SubmitTarget::Database => self.submit_to_database(submit, scope, state, depth).await,
            SubmitTarget::Api => self.submit_to_api(submit, scope, state, depth).await,
        }
    }

    async fn submit_to_database(
        &self,
        submit: &SubmitAction,
        scope: DispatchScope<'_>,
        state: &mut RuntimeState,
        depth: usize,
    ) -> AppResult<()> {
        let Some(table) = submit
            .table
            .as_deref()
            .filter(|table| !table.trim().is_empty())
        else {
            self.ignore(scope, "submit", "database submit requires a table")
                .await;
            return Ok(());
        };

        let mut fields = collect_form_fields(&submit.fields, &state.form);
        if let Some(schema) = scope.document.table_schema(table) {
            for (field, default) in schema.defaults() {
                fields
                    .entry(field.to_owned())
                    .or_insert_with(|| default.clone());
            }
        }

        let record = Record::new(self.record_ids.next_id(), fields)?;
        let record_id = record.id().to_owned();
        if let Err(error) = self
            .data_store
            .insert(scope.app_instance_id, table, record)
            .await
        {
            warn!(table, error = %error, "database submit failed");
            return self
                .follow_up(submit.on_error.as_deref(), scope, state, depth)
                .await;
        }

        for form_field_id in submit.fields.values() {
            state.form.remove(form_field_id.as_str());
        }
        self.emit(
            scope,
            RuntimeEvent::RecordInserted {
                table: table.to_owned(),
                record_id,
            },
        )
        .await;

        self.follow_up(submit.on_success.as_deref(), scope, state, depth)
            .await
    }

    async fn submit_to_api(
        &self,
        submit: &SubmitAction,
        scope: DispatchScope<'_>,
        state: &mut RuntimeState,
        depth: usize,
    ) -> AppResult<()> {
        let Some(endpoint) = submit
            .endpoint
            .as_deref()
            .filter(|endpoint| !endpoint.trim().is_empty())
        else {
            self.ignore(scope, "submit", "api submit requires an endpoint")
                .await;
            return Ok(());
        };

        let request = {
            let context = state.template_context(scope.item);
            ApiSubmitRequest {
                endpoint: context.interpolate(endpoint),
                method: submit
                    .method
                    .as_deref()
                    .map(str::trim)
                    .filter(|method| !method.is_empty())
                    .unwrap_or("POST")
                    .to_ascii_uppercase(),
                headers: submit
                    .headers
                    .iter()
                    .map(|(name, value)| (name.clone(), context.interpolate(value)))
                    .collect(),
                fields: collect_form_fields(&submit.fields, &state.form),
            }
        };

        debug!(endpoint = %request.endpoint, "queued api submit");
        state.pending_api_submits.push(PendingApiSubmit {
            request,
            on_success: submit.on_success.as_deref().cloned(),
            on_error: submit.on_error.as_deref().cloned(),
            item: scope.item.cloned(),
            depth,
            generation: state.dispatch_generation,
        });
        Ok(())
    }

    /// Sends a queued api submit and reports whether it succeeded.
    ///
    /// Holds no runtime state, so callers await it without the runtime lock.
    pub async fn send_api_submit(&self, submit: &PendingApiSubmit) -> bool {
        match self.api_gateway.submit(submit.request.clone()).await {
            Ok(()) => true,
            Err(error) => {
                warn!(endpoint = %submit.request.endpoint, error = %error, "api submit failed");
                false
            }
        }
    }

    /// Applies the outcome of a sent api submit.
    ///
    /// The branch runs one level below the submit. A root dispatch since the
    /// submit was queued supersedes it: the outcome is recorded, no branch runs.
    pub async fn complete_api_submit(
        &self,
        submit: PendingApiSubmit,
        succeeded: bool,
        scope: DispatchScope<'_>,
        state: &mut RuntimeState,
    ) -> AppResult<()> {
        self.emit(
            scope,
            RuntimeEvent::ApiSubmitted {
                endpoint: submit.request.endpoint.clone(),
                succeeded,
            },
        )
        .await;

        if submit.generation != state.dispatch_generation {
            self.ignore(scope, "submit", "superseded by a newer dispatch")
                .await;
            return Ok(());
        }

        let follow_up = if succeeded {
            submit.on_success.as_ref()
        } else {
            submit.on_error.as_ref()
        };
        self.follow_up(
            follow_up,
            scope.with_item(submit.item.as_ref()),
            state,
            submit.depth,
        )
        .await
    }
}
