//! The CRUD orchestrator.

use tracing::{debug, instrument, trace, warn};

use crate::core::{
    BackendCapability, BatchController, Callback, Capture, Completion, Counting, Entity, Gather,
    Invoker, StoreBackend,
};
use crate::crud::{CrudConfig, Subject};
use crate::error::{
    BackendError, ConnectionError, ResourceError, StorageError, StorageResult, ValidationError,
};
use crate::filter::FilterCompiler;
use crate::named::{NamedQueries, Variables};
use crate::types::QueryModel;

/// Write verbs that may run as a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteVerb {
    Save,
    Update,
    Delete,
}

impl WriteVerb {
    fn name(self) -> &'static str {
        match self {
            WriteVerb::Save => "save",
            WriteVerb::Update => "update",
            WriteVerb::Delete => "delete",
        }
    }

    fn past_tense(self) -> &'static str {
        match self {
            WriteVerb::Save => "saved",
            WriteVerb::Update => "updated",
            WriteVerb::Delete => "deleted",
        }
    }

    fn capability(self) -> BackendCapability {
        match self {
            WriteVerb::Save => BackendCapability::NativeSaveBatch,
            WriteVerb::Update => BackendCapability::NativeUpdateBatch,
            WriteVerb::Delete => BackendCapability::NativeDeleteBatch,
        }
    }
}

/// Store-agnostic CRUD over a [`StoreBackend`].
///
/// Every verb has a callback form (`*_with`) and a blocking form. The
/// blocking form runs the callback form with a collecting callback, so both
/// observe exactly the same behavior.
///
/// # Batches
///
/// `save`, `update` and `delete` accept collections. When the backend
/// advertises the matching native batch capability (and
/// [`CrudConfig::force_simulated_batch`] is off) the collection is handed
/// over in one call and the callback is notified once. Otherwise the
/// collection is iterated in order, one backend call and one notification
/// per element, stopping at the first failure. An empty collection produces
/// a single success notification with an empty result.
///
/// # Example
///
/// ```ignore
/// use helios_crud::backends::memory::MemoryBackend;
/// use helios_crud::crud::{Crud, Subject};
///
/// let crud = Crud::new(MemoryBackend::new());
/// let saved = crud.save(Person::named("Steve"))?;
///
/// let found = crud.find(&Person::named("Steve"))?;
/// assert_eq!(found.map(|p| p.id), Some(saved.id));
///
/// let removed = crud.delete(Subject::<Person>::of_type())?;
/// assert_eq!(removed, 1);
/// ```
#[derive(Debug)]
pub struct Crud<B: StoreBackend> {
    backend: B,
    config: CrudConfig,
    named: NamedQueries,
}

impl<B: StoreBackend> Crud<B> {
    /// Creates an orchestrator with the default configuration.
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, CrudConfig::default())
    }

    /// Creates an orchestrator with a custom configuration.
    pub fn with_config(backend: B, config: CrudConfig) -> Self {
        Self {
            backend,
            config,
            named: NamedQueries::new(),
        }
    }

    /// Replaces the named-query registry.
    pub fn with_named_queries(mut self, named: NamedQueries) -> Self {
        self.named = named;
        self
    }

    /// The underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The active configuration.
    pub fn config(&self) -> &CrudConfig {
        &self.config
    }

    /// The named-query registry.
    pub fn named_queries(&self) -> &NamedQueries {
        &self.named
    }

    // ========================================================================
    // Save / update
    // ========================================================================

    /// Saves one entity or a collection.
    ///
    /// The callback receives the stored entities: one notification holding
    /// everything for a single item or a native batch, one notification per
    /// element for a simulated batch.
    #[instrument(skip(self, subject, callback), fields(entity_type = T::metadata().name(), shape = subject.shape()))]
    pub fn save_with<T: Entity>(&self, subject: Subject<T>, callback: &mut dyn Callback<Vec<T>>) {
        self.write_with(WriteVerb::Save, subject, callback);
    }

    /// Updates one entity or a collection. Notifies like [`save_with`](Self::save_with).
    #[instrument(skip(self, subject, callback), fields(entity_type = T::metadata().name(), shape = subject.shape()))]
    pub fn update_with<T: Entity>(&self, subject: Subject<T>, callback: &mut dyn Callback<Vec<T>>) {
        self.write_with(WriteVerb::Update, subject, callback);
    }

    /// Saves one entity and returns it as stored.
    pub fn save<T: Entity>(&self, item: T) -> StorageResult<T> {
        let mut capture: Capture<Vec<T>> = Capture::new();
        self.save_with(Subject::One(item), &mut capture);
        only_item(capture.into_result("save")?, "save")
    }

    /// Saves a collection and returns the stored entities in input order.
    ///
    /// A failing simulated batch returns the first error; elements before it
    /// remain saved.
    pub fn save_all<T: Entity>(&self, items: Vec<T>) -> StorageResult<Vec<T>> {
        let mut gather: Gather<Vec<T>> = Gather::new();
        self.save_with(Subject::Many(items), &mut gather);
        gather.into_result("save")
    }

    /// Updates one entity and returns it as stored.
    pub fn update<T: Entity>(&self, item: T) -> StorageResult<T> {
        let mut capture: Capture<Vec<T>> = Capture::new();
        self.update_with(Subject::One(item), &mut capture);
        only_item(capture.into_result("update")?, "update")
    }

    /// Updates a collection and returns the stored entities in input order.
    pub fn update_all<T: Entity>(&self, items: Vec<T>) -> StorageResult<Vec<T>> {
        let mut gather: Gather<Vec<T>> = Gather::new();
        self.update_with(Subject::Many(items), &mut gather);
        gather.into_result("update")
    }

    fn write_with<T: Entity>(
        &self,
        verb: WriteVerb,
        subject: Subject<T>,
        callback: &mut dyn Callback<Vec<T>>,
    ) {
        if let Err(error) = self.ensure_connected(verb.name()) {
            return fail(callback, error);
        }
        let message = self.message(verb.past_tense(), T::metadata().name());

        match subject {
            Subject::One(item) => {
                let result = match verb {
                    WriteVerb::Update => self.backend.perform_update(item),
                    _ => self.backend.perform_save(item),
                };
                Invoker::new(callback, message).complete(result.map(|stored| vec![stored]));
            }
            Subject::Many(items) => {
                let backend = &self.backend;
                self.dispatch_batch(
                    verb,
                    items,
                    callback,
                    None,
                    |items| match verb {
                        WriteVerb::Update => backend.perform_update_batch(items),
                        _ => backend.perform_save_batch(items),
                    },
                    |item| {
                        let stored = match verb {
                            WriteVerb::Update => backend.perform_update(item),
                            _ => backend.perform_save(item),
                        };
                        stored.map(|stored| vec![stored])
                    },
                );
            }
            other => fail(callback, unsupported(verb.name(), &other)),
        }
    }

    // ========================================================================
    // Delete
    // ========================================================================

    /// Deletes one entity, a collection, every entity of a type, or every
    /// match of a query.
    ///
    /// The callback receives deleted-row counts. Deleting by type or query
    /// uses the backend's query delete when advertised; otherwise the matches
    /// are listed and then deleted as a batch, and only the delete outcome is
    /// reported.
    #[instrument(skip(self, subject, callback), fields(entity_type = T::metadata().name(), shape = subject.shape()))]
    pub fn delete_with<T: Entity>(&self, subject: Subject<T>, callback: &mut dyn Callback<usize>) {
        if let Err(error) = self.ensure_connected("delete") {
            return fail(callback, error);
        }
        let message = self.message("deleted", T::metadata().name());

        match subject {
            Subject::One(item) => {
                Invoker::new(callback, message).complete(self.backend.perform_delete(&item));
            }
            Subject::Many(items) => self.delete_batch(items, callback, None),
            Subject::OfType => self.delete_query::<T>(QueryModel::for_entity::<T>(), callback),
            Subject::Query(query) => self.delete_query::<T>(query, callback),
        }
    }

    /// Deletes and returns the total number of rows removed.
    pub fn delete<T: Entity>(&self, subject: Subject<T>) -> StorageResult<usize> {
        let mut gather: Gather<usize> = Gather::new();
        self.delete_with(subject, &mut gather);
        gather.into_result("delete")
    }

    fn delete_batch<T: Entity>(
        &self,
        items: Vec<T>,
        callback: &mut dyn Callback<usize>,
        source: Option<&mut dyn Callback<usize>>,
    ) {
        let backend = &self.backend;
        self.dispatch_batch(
            WriteVerb::Delete,
            items,
            callback,
            source,
            |items| backend.perform_delete_batch(&items),
            |item| backend.perform_delete(&item),
        );
    }

    fn delete_query<T: Entity>(&self, query: QueryModel, callback: &mut dyn Callback<usize>) {
        let message = self.message("deleted", T::metadata().name());
        if let Err(error) = query.validate() {
            return Invoker::new(callback, message).failure(error);
        }

        if self.backend.supports(BackendCapability::QueryDelete) {
            debug!(query = %query, "delete by query");
            return Invoker::new(callback, message)
                .complete(self.backend.perform_delete_query::<T>(&query));
        }

        debug!(query = %query, "composite delete: list then batch delete");
        let mut total: Gather<usize> = Gather::new();
        {
            let mut chained = DeleteListed {
                crud: self,
                target: callback,
                source: &mut total,
            };
            let mut invoker: Invoker<'_, Vec<T>> =
                Invoker::new(&mut chained, self.message("listed", T::metadata().name()));
            invoker.complete(self.fetch::<T>(&query));
        }
        debug!(deleted = *total.total(), "composite delete finished");
    }

    // ========================================================================
    // Find / list / count
    // ========================================================================

    /// Finds the single entity matching a template or query.
    ///
    /// Notifies `None` when nothing matches and
    /// [`ResourceError::Ambiguous`] when more than one entity matches.
    #[instrument(skip(self, subject, callback), fields(entity_type = T::metadata().name(), shape = subject.shape()))]
    pub fn find_with<T: Entity>(&self, subject: Subject<T>, callback: &mut dyn Callback<Option<T>>) {
        if let Err(error) = self.ensure_connected("find") {
            return fail(callback, error);
        }
        let query = match subject {
            Subject::One(template) => self.template_query(&template, &FilterCompiler::new()),
            Subject::Query(query) => query,
            other => return fail(callback, unsupported("find", &other)),
        };

        let result = self
            .fetch::<T>(&query.unpaginated())
            .and_then(|mut items| match items.len() {
                0 | 1 => Ok(items.pop()),
                count => Err(ResourceError::Ambiguous {
                    entity_type: T::metadata().name().to_string(),
                    count,
                }
                .into()),
            });
        Invoker::new(callback, self.message("found", T::metadata().name())).complete(result);
    }

    /// Finds the single entity matching a template.
    pub fn find<T: Entity>(&self, template: &T) -> StorageResult<Option<T>> {
        self.find_by(Subject::One(template.clone()))
    }

    /// Finds the single entity matching a template or query.
    pub fn find_by<T: Entity>(&self, subject: Subject<T>) -> StorageResult<Option<T>> {
        let mut capture: Capture<Option<T>> = Capture::new();
        self.find_with(subject, &mut capture);
        capture.into_result("find")
    }

    /// Lists entities matching a template or query.
    #[instrument(skip(self, subject, callback), fields(entity_type = T::metadata().name(), shape = subject.shape()))]
    pub fn list_with<T: Entity>(&self, subject: Subject<T>, callback: &mut dyn Callback<Vec<T>>) {
        if let Err(error) = self.ensure_connected("list") {
            return fail(callback, error);
        }
        let query = match subject {
            Subject::One(template) => self.template_query(&template, &FilterCompiler::new()),
            Subject::Query(query) => query,
            other => return fail(callback, unsupported("list", &other)),
        };
        self.list_query_with(&query, callback);
    }

    /// Lists entities matching a template or query.
    pub fn list<T: Entity>(&self, subject: Subject<T>) -> StorageResult<Vec<T>> {
        let mut capture: Capture<Vec<T>> = Capture::new();
        self.list_with(subject, &mut capture);
        capture.into_result("list")
    }

    /// Counts entities matching a template, a type, or a query.
    ///
    /// Uses the backend's native count when advertised, otherwise lists and
    /// counts the results. Pagination of the query is ignored.
    #[instrument(skip(self, subject, callback), fields(entity_type = T::metadata().name(), shape = subject.shape()))]
    pub fn count_with<T: Entity>(&self, subject: Subject<T>, callback: &mut dyn Callback<usize>) {
        if let Err(error) = self.ensure_connected("count") {
            return fail(callback, error);
        }
        let query = match subject {
            Subject::One(template) => self.template_query(&template, &FilterCompiler::new()),
            Subject::OfType => QueryModel::for_entity::<T>(),
            Subject::Query(query) => query,
            other => return fail(callback, unsupported("count", &other)),
        }
        .unpaginated();

        if self.backend.supports(BackendCapability::NativeCount) {
            let message = self.message("counted", T::metadata().name());
            return Invoker::new(callback, message).complete(self.backend.perform_count(&query));
        }

        debug!(query = %query, "count fallback: list and count");
        let mut counting = Counting::new(callback);
        self.list_query_with::<T>(&query, &mut counting);
    }

    /// Counts entities matching a template, a type, or a query.
    pub fn count<T: Entity>(&self, subject: Subject<T>) -> StorageResult<usize> {
        let mut capture: Capture<usize> = Capture::new();
        self.count_with(subject, &mut capture);
        capture.into_result("count")
    }

    /// Lists entities matching a template compiled with a custom compiler.
    pub fn query_by_example_with<T: Entity>(
        &self,
        template: &T,
        compiler: &FilterCompiler,
        callback: &mut dyn Callback<Vec<T>>,
    ) {
        if let Err(error) = self.ensure_connected("list") {
            return fail(callback, error);
        }
        let query = self.template_query(template, compiler);
        self.list_query_with(&query, callback);
    }

    /// Lists entities matching a template compiled with a custom compiler.
    pub fn query_by_example<T: Entity>(
        &self,
        template: &T,
        compiler: &FilterCompiler,
    ) -> StorageResult<Vec<T>> {
        let mut capture: Capture<Vec<T>> = Capture::new();
        self.query_by_example_with(template, compiler, &mut capture);
        capture.into_result("list")
    }

    /// Lists entities of type `T` filtered only by the compiler's null
    /// checks.
    pub fn query_by_type<T: Entity>(&self, compiler: &FilterCompiler) -> StorageResult<Vec<T>> {
        self.ensure_connected("list")?;
        let filter = compiler.compile_type(T::metadata())?;
        let query = QueryModel::for_entity::<T>()
            .with_filter_opt(filter)
            .with_order_by(self.config.default_order_by.clone());
        self.list(Subject::Query(query))
    }

    fn list_query_with<T: Entity>(&self, query: &QueryModel, callback: &mut dyn Callback<Vec<T>>) {
        let result = self.fetch::<T>(query);
        Invoker::new(callback, self.message("listed", T::metadata().name())).complete(result);
    }

    // ========================================================================
    // Named queries
    // ========================================================================

    /// Lists entities using a named structured query.
    #[instrument(skip(self, vars, callback), fields(entity_type = T::metadata().name()))]
    pub fn list_named_with<T: Entity>(
        &self,
        provider: &str,
        name: &str,
        vars: &Variables,
        callback: &mut dyn Callback<Vec<T>>,
    ) {
        if let Err(error) = self.ensure_connected("list") {
            return fail(callback, error);
        }
        match self.named.resolve_query(provider, name, vars) {
            Ok(query) => self.list_query_with(&query, callback),
            Err(error) => fail(callback, error),
        }
    }

    /// Lists entities using a named structured query.
    pub fn list_named<T: Entity>(
        &self,
        provider: &str,
        name: &str,
        vars: &Variables,
    ) -> StorageResult<Vec<T>> {
        let mut capture: Capture<Vec<T>> = Capture::new();
        self.list_named_with(provider, name, vars, &mut capture);
        capture.into_result("list")
    }

    /// Executes a named raw statement, reporting the affected-row count.
    #[instrument(skip(self, vars, callback))]
    pub fn execute_named_with(
        &self,
        provider: &str,
        name: &str,
        vars: &Variables,
        callback: &mut dyn Callback<usize>,
    ) {
        if let Err(error) = self.ensure_connected("execute") {
            return fail(callback, error);
        }
        let statement = match self.named.resolve_raw(provider, name, vars) {
            Ok(statement) => statement,
            Err(error) => return fail(callback, error),
        };
        if !self.backend.supports(BackendCapability::RawStatements) {
            let error =
                BackendError::unsupported(self.backend.name(), BackendCapability::RawStatements);
            return fail(callback, error.into());
        }

        let message = self.message("executed", name);
        Invoker::new(callback, message).complete(self.backend.perform_statement(&statement));
    }

    /// Executes a named raw statement and returns the affected-row count.
    pub fn execute_named(&self, provider: &str, name: &str, vars: &Variables) -> StorageResult<usize> {
        let mut capture: Capture<usize> = Capture::new();
        self.execute_named_with(provider, name, vars, &mut capture);
        capture.into_result("execute")
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn ensure_connected(&self, operation: &str) -> StorageResult<()> {
        if self.backend.is_connected() {
            return Ok(());
        }
        Err(ConnectionError::Closed {
            backend_name: self.backend.name().to_string(),
            operation: operation.to_string(),
        }
        .into())
    }

    fn message(&self, verb: &str, subject: &str) -> String {
        if self.config.success_messages {
            format!("{} {}", verb, subject)
        } else {
            String::new()
        }
    }

    fn template_query<T: Entity>(&self, template: &T, compiler: &FilterCompiler) -> QueryModel {
        QueryModel::for_entity::<T>()
            .with_filter_opt(compiler.compile(template))
            .with_order_by(self.config.default_order_by.clone())
    }

    /// Runs a list, emulating pagination when the backend cannot page.
    fn fetch<T: Entity>(&self, query: &QueryModel) -> StorageResult<Vec<T>> {
        query.validate()?;
        if !query.is_paginated() || self.backend.supports(BackendCapability::PaginatedQuery) {
            return self.backend.perform_list(query);
        }

        let offset = query.offset().unwrap_or(0);
        let limit = query.limit().unwrap_or(usize::MAX);
        debug!(offset, limit, "emulating pagination");
        let all = self.backend.perform_list::<T>(&query.unpaginated())?;
        Ok(all.into_iter().skip(offset).take(limit).collect())
    }

    fn uses_native_batch(&self, verb: WriteVerb) -> bool {
        !self.config.force_simulated_batch && self.backend.supports(verb.capability())
    }

    /// Runs a collection natively or element by element.
    fn dispatch_batch<T, R>(
        &self,
        verb: WriteVerb,
        items: Vec<T>,
        callback: &mut dyn Callback<R>,
        mut source: Option<&mut dyn Callback<R>>,
        native: impl FnOnce(Vec<T>) -> StorageResult<R>,
        mut single: impl FnMut(T) -> StorageResult<R>,
    ) where
        T: Entity,
        R: Clone + Default,
    {
        let entity_type = T::metadata().name();
        let message = self.message(verb.past_tense(), entity_type);

        if items.is_empty() {
            debug!(verb = verb.name(), entity_type, "empty batch");
            let mut invoker = Invoker::new(callback, message);
            if let Some(source) = source {
                invoker = invoker.with_source(source);
            }
            return invoker.success(R::default());
        }

        if self.uses_native_batch(verb) {
            debug!(verb = verb.name(), entity_type, size = items.len(), "native batch");
            let mut invoker = Invoker::new(callback, message);
            if let Some(source) = source {
                invoker = invoker.with_source(source);
            }
            return invoker.complete(native(items));
        }

        let mut batch = BatchController::new();
        batch.init_batch(items.len());
        debug!(
            verb = verb.name(),
            entity_type,
            size = items.len(),
            batch_id = ?batch.id(),
            "simulated batch"
        );

        for (index, item) in items.into_iter().enumerate() {
            let result = single(item);
            let failed = result.is_err();
            match &result {
                Ok(_) => trace!(index, "batch item completed"),
                Err(error) => warn!(index, error = %error, "batch item failed; stopping"),
            }

            let mut invoker = Invoker::new(&mut *callback, message.clone()).with_batch(&mut batch);
            if let Some(source) = source.as_deref_mut() {
                invoker = invoker.with_source(source);
            }
            invoker.complete(result);

            if failed {
                break;
            }
        }
    }
}

/// Deletes whatever the chained list produced.
struct DeleteListed<'a, B: StoreBackend> {
    crud: &'a Crud<B>,
    target: &'a mut dyn Callback<usize>,
    source: &'a mut dyn Callback<usize>,
}

impl<B: StoreBackend, T: Entity> Callback<Vec<T>> for DeleteListed<'_, B> {
    fn on_success(&mut self, items: Vec<T>, _completion: &Completion<'_>) {
        debug!(matched = items.len(), "deleting listed entities");
        let source: &mut dyn Callback<usize> = &mut *self.source;
        self.crud.delete_batch(items, &mut *self.target, Some(source));
    }

    fn on_failure(&mut self, error: StorageError, _completion: &Completion<'_>) {
        fail(&mut *self.target, error);
    }
}

fn fail<R: Clone>(callback: &mut dyn Callback<R>, error: StorageError) {
    Invoker::new(callback, "").failure(error);
}

fn unsupported<T>(operation: &str, subject: &Subject<T>) -> StorageError {
    ValidationError::UnsupportedArgument {
        operation: operation.to_string(),
        shape: subject.shape().to_string(),
    }
    .into()
}

fn only_item<T>(mut items: Vec<T>, operation: &str) -> StorageResult<T> {
    items.pop().ok_or_else(|| {
        BackendError::NoOutcome {
            operation: operation.to_string(),
        }
        .into()
    })
}
