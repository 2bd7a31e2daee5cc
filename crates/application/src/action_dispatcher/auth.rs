use super::*;

impl ActionDispatcher {
    pub(super) async fn login(
        &self,
        login: &AuthLoginAction,
        scope: DispatchScope<'_>,
        state: &mut RuntimeState,
        depth: usize,
    ) -> AppResult<()> {
        let Some(auth) = scope.document.authentication() else {
            debug!("auth:login ignored without authentication config");
            return Ok(());
        };

        let email = state.form.get(login.fields.email.as_str()).cloned();
        let password = state.form.get(login.fields.password.as_str()).cloned();
        let user = match (email, password) {
            (Some(email), Some(password)) => self
                .data_store
                .get_table(scope.app_instance_id, auth.user_table())
                .await?
                .into_iter()
                .find(|user| {
                    user.get(auth.email_field()) == Some(&email)
                        && user.get(auth.password_field()) == Some(&password)
                }),
            _ => None,
        };

        let Some(user) = user else {
            debug!(user_table = auth.user_table(), "credentials did not match");
            return self
                .follow_up(login.on_error.as_deref(), scope, state, depth)
                .await;
        };

        self.start_session(auth, user, scope, state).await;
        Ok(())
    }

    pub(super) async fn signup(
        &self,
        signup: &AuthSignupAction,
        scope: DispatchScope<'_>,
        state: &mut RuntimeState,
        depth: usize,
    ) -> AppResult<()> {
        let Some(auth) = scope.document.authentication() else {
            debug!("auth:signup ignored without authentication config");
            return Ok(());
        };

        let email = signup
            .fields
            .get(auth.email_field())
            .and_then(|form_field_id| state.form.get(form_field_id.as_str()))
            .filter(|email| !is_blank(email))
            .cloned();
        let Some(email) = email else {
            debug!("auth:signup without an email value");
            return self
                .follow_up(signup.on_error.as_deref(), scope, state, depth)
                .await;
        };

        let already_registered = self
            .data_store
            .get_table(scope.app_instance_id, auth.user_table())
            .await?
            .iter()
            .any(|user| user.get(auth.email_field()) == Some(&email));
        if already_registered {
            debug!(user_table = auth.user_table(), "auth:signup email already registered");
            return self
                .follow_up(signup.on_error.as_deref(), scope, state, depth)
                .await;
        }

        let user = Record::new(
            self.record_ids.next_id(),
            collect_form_fields(&signup.fields, &state.form),
        )?;
        self.data_store
            .insert(scope.app_instance_id, auth.user_table(), user.clone())
            .await?;
        self.emit(
            scope,
            RuntimeEvent::RecordInserted {
                table: auth.user_table().to_owned(),
                record_id: user.id().to_owned(),
            },
        )
        .await;

        self.start_session(auth, user, scope, state).await;
        Ok(())
    }

    pub(super) async fn logout(
        &self,
        logout: &AuthLogoutAction,
        scope: DispatchScope<'_>,
        state: &mut RuntimeState,
        depth: usize,
    ) -> AppResult<()> {
        if scope.document.authentication().is_none() {
            debug!("auth:logout ignored without authentication config");
            return Ok(());
        }

        if state.session.take().is_some() {
            self.emit(scope, RuntimeEvent::SessionEnded).await;
        }

        match logout.on_success.as_deref() {
            Some(on_success) => {
                self.follow_up(Some(on_success), scope, state, depth)
                    .await
            }
            None => {
                self.go_back(scope, state).await;
                Ok(())
            }
        }
    }

    async fn start_session(
        &self,
        auth: &AuthConfig,
        user: Record,
        scope: DispatchScope<'_>,
        state: &mut RuntimeState,
    ) {
        let user_id = user.id().to_owned();
        state.session = Some(Session::new(user));
        state.form.clear();
        self.emit(scope, RuntimeEvent::SessionStarted { user_id })
            .await;

        match auth.post_login_screen() {
            Some(post_login_screen) => {
                self.navigate(post_login_screen.to_owned(), scope, state)
                    .await;
            }
            None => self.go_back(scope, state).await,
        }
    }
}
