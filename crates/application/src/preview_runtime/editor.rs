use appdeck_domain::insert_snippet;

use super::*;

impl PreviewRuntime {
    /// Replaces the editor text.
    ///
    /// The text is always kept. A parse failure retains the last valid
    /// document and returns [`AppError::Parse`]; an edit that parses to an
    /// equal document adds no undo step.
    pub async fn edit_document(&mut self, document_text: String) -> AppResult<()> {
        self.document_text = document_text;

        match AppDefinition::parse(self.document_text.as_str()) {
            Ok(document) => {
                self.parse_error = None;
                self.record_document(document);
                self.ensure_schema_tables().await
            }
            Err(error) => {
                debug!(app_instance_id = %self.app_instance_id, error = %error, "document edit rejected");
                self.parse_error = Some(error.clone());
                Err(error.into())
            }
        }
    }

    /// Steps the document back and reports whether anything changed.
    pub async fn undo(&mut self) -> AppResult<bool> {
        if !self.history.as_mut().is_some_and(History::undo) {
            return Ok(false);
        }

        self.sync_document_text()?;
        self.ensure_schema_tables().await?;
        Ok(true)
    }

    /// Steps the document forward and reports whether anything changed.
    pub async fn redo(&mut self) -> AppResult<bool> {
        if !self.history.as_mut().is_some_and(History::redo) {
            return Ok(false);
        }

        self.sync_document_text()?;
        self.ensure_schema_tables().await?;
        Ok(true)
    }

    /// Inserts snippet components into a screen of the current editor text.
    ///
    /// On failure the document is left unmodified.
    pub async fn insert_snippet(
        &mut self,
        target_screen_id: Option<&str>,
        snippet_text: &str,
        stamp: i64,
    ) -> AppResult<()> {
        let document = insert_snippet(
            self.document_text.as_str(),
            target_screen_id,
            snippet_text,
            stamp,
        )?;

        self.record_document(document);
        self.sync_document_text()?;
        self.ensure_schema_tables().await
    }

    fn record_document(&mut self, document: AppDefinition) {
        match self.history.as_mut() {
            Some(history) => {
                history.set(document);
            }
            None => self.history = Some(History::new(document)),
        }
    }

    /// Rewrites the editor text from the present document.
    fn sync_document_text(&mut self) -> AppResult<()> {
        if let Some(document) = self.history.as_ref().map(History::present) {
            self.document_text = document.to_json_text()?;
            self.parse_error = None;
        }

        Ok(())
    }

    pub(super) async fn ensure_schema_tables(&self) -> AppResult<()> {
        let Some(document) = self.document() else {
            return Ok(());
        };

        for table in document.database_schema().keys() {
            self.dispatcher
                .data_store()
                .ensure_table(self.app_instance_id, table.as_str())
                .await?;
        }

        Ok(())
    }
}
