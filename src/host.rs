//! Owns one script execution context and drives its per-frame callback.
//!
//! Lifecycle:
//!
//! * `Uninitialized` until [`ScriptHost::start`] registers the vector bridge,
//!   builds the engine and publishes the rotation API.
//! * `Initializing` while the script text is being fetched. Frame ticks keep
//!   arriving during this phase and do nothing beyond polling the load once.
//! * `Ready` after the text compiled and its top-level statements ran. The
//!   update handle is resolved exactly once here and may be absent, in which
//!   case ticks stay no-ops.
//! * `Failed` when the text could not be read, parsed or executed. The
//!   context is dropped and nothing runs afterwards.

use std::future::Future;
use std::task::{Context, Poll};

use futures::task::noop_waker_ref;
use rhai::{CallFnOptions, Dynamic, Engine, Scope, AST, FLOAT};

use crate::api::{RotationApi, TargetSlot, PUBLISHED_FUNCTIONS};
use crate::bridge;
use crate::config::ScriptHostConfig;
use crate::diagnostics::{Diagnostic, DiagnosticLog};
use crate::source::{LoadFuture, ScriptLoadError, ScriptSource};
use crate::transform::SharedObject;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

/// Resolved reference to the script's per-frame callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateHandle {
    name: String,
}

impl UpdateHandle {
    pub fn name(&self) -> &str {
        &self.name
    }
}

struct LoadedScript {
    engine: Engine,
    ast: AST,
    scope: Scope<'static>,
    update: Option<UpdateHandle>,
}

enum Phase {
    Uninitialized,
    Initializing { engine: Engine, name: String, pending: LoadFuture },
    Ready(LoadedScript),
    Failed,
}

pub struct ScriptHost {
    config: ScriptHostConfig,
    target: TargetSlot,
    diagnostics: DiagnosticLog,
    phase: Phase,
    last_error: Option<String>,
}

impl ScriptHost {
    pub fn new(config: ScriptHostConfig) -> Self {
        Self {
            config,
            target: TargetSlot::default(),
            diagnostics: DiagnosticLog::new(),
            phase: Phase::Uninitialized,
            last_error: None,
        }
    }

    pub fn state(&self) -> HostState {
        match self.phase {
            Phase::Uninitialized => HostState::Uninitialized,
            Phase::Initializing { .. } => HostState::Initializing,
            Phase::Ready(_) => HostState::Ready,
            Phase::Failed => HostState::Failed,
        }
    }

    /// The object the published functions read and write. Only a weak
    /// reference is kept; the caller owns the object.
    pub fn set_target(&mut self, target: Option<&SharedObject>) {
        self.target.set(target);
    }

    pub fn target(&self) -> Option<SharedObject> {
        self.target.get()
    }

    pub fn update_handle(&self) -> Option<&UpdateHandle> {
        match &self.phase {
            Phase::Ready(script) => script.update.as_ref(),
            _ => None,
        }
    }

    pub fn has_update_handle(&self) -> bool {
        self.update_handle().is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn take_diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.take()
    }

    /// Diagnostics pushed out of the bounded buffer before anyone drained them.
    pub fn discarded_diagnostics(&self) -> u64 {
        self.diagnostics.discarded()
    }

    /// Builds the execution context and begins loading `source`. The load
    /// completes during later [`tick`](Self::tick) calls or through
    /// [`finish_initialization`](Self::finish_initialization).
    pub fn start(&mut self, source: &dyn ScriptSource) {
        if !matches!(self.phase, Phase::Uninitialized) {
            tracing::warn!(script = source.name(), state = ?self.state(), "script host already started");
            return;
        }
        let bridge = bridge::register();
        let mut engine = Engine::new();
        engine.set_fast_operators(true);
        engine.on_print(|text| tracing::info!(target: "script", "{text}"));
        bridge.install(&mut engine);
        RotationApi::new(self.target.clone(), self.diagnostics.clone(), bridge).register(&mut engine);

        tracing::debug!(script = source.name(), natives = ?PUBLISHED_FUNCTIONS, "script host initializing");
        self.phase = Phase::Initializing { engine, name: source.name().to_string(), pending: source.load() };
    }

    /// Starts the host and waits for the script to finish loading.
    pub async fn initialize(&mut self, source: &dyn ScriptSource) -> Result<(), ScriptLoadError> {
        self.start(source);
        self.finish_initialization().await
    }

    pub async fn finish_initialization(&mut self) -> Result<(), ScriptLoadError> {
        let loaded = match &mut self.phase {
            Phase::Initializing { pending, .. } => pending.await,
            Phase::Failed => {
                let message = self.last_error.clone().unwrap_or_default();
                return Err(ScriptLoadError::AlreadyFailed(message));
            }
            Phase::Uninitialized => return Err(ScriptLoadError::NotStarted),
            Phase::Ready(_) => return Ok(()),
        };
        self.complete(loaded)
    }

    pub fn block_until_initialized(&mut self) -> Result<(), ScriptLoadError> {
        pollster::block_on(self.finish_initialization())
    }

    /// Per-frame entry point. Never fails; problems go to the diagnostic log.
    pub fn tick(&mut self, dt: f32) {
        if matches!(self.phase, Phase::Initializing { .. }) {
            self.poll_initialization();
        }

        let Phase::Ready(script) = &mut self.phase else {
            return;
        };
        let Some(handle) = &script.update else {
            return;
        };
        let options = CallFnOptions::new().eval_ast(false).rewind_scope(true);
        let result = script.engine.call_fn_with_options::<Dynamic>(
            options,
            &mut script.scope,
            &script.ast,
            &handle.name,
            (dt as FLOAT,),
        );
        match result {
            Ok(_) => self.last_error = None,
            Err(err) => {
                let message = single_line(&err.to_string());
                self.diagnostics.report(Diagnostic::UpdateFailed { message: message.clone() });
                self.last_error = Some(message);
            }
        }
    }

    fn poll_initialization(&mut self) {
        let Phase::Initializing { pending, .. } = &mut self.phase else {
            return;
        };
        let mut cx = Context::from_waker(noop_waker_ref());
        let loaded = match pending.as_mut().poll(&mut cx) {
            Poll::Ready(loaded) => loaded,
            Poll::Pending => return,
        };
        // Already reported through the diagnostic log.
        let _ = self.complete(loaded);
    }

    fn complete(&mut self, loaded: Result<String, ScriptLoadError>) -> Result<(), ScriptLoadError> {
        let (engine, name) = match std::mem::replace(&mut self.phase, Phase::Failed) {
            Phase::Initializing { engine, name, .. } => (engine, name),
            other => {
                self.phase = other;
                return Ok(());
            }
        };
        match loaded.and_then(|text| self.load_script(engine, &name, &text)) {
            Ok(script) => {
                tracing::info!(
                    script = %name,
                    update = ?script.update.as_ref().map(UpdateHandle::name),
                    "script host ready"
                );
                self.phase = Phase::Ready(script);
                Ok(())
            }
            Err(err) => {
                let message = single_line(&err.to_string());
                self.diagnostics.report(Diagnostic::ScriptLoadFailed { message: message.clone() });
                self.last_error = Some(message);
                Err(err)
            }
        }
    }

    fn load_script(&self, engine: Engine, name: &str, text: &str) -> Result<LoadedScript, ScriptLoadError> {
        let ast = engine
            .compile(text)
            .map_err(|err| ScriptLoadError::Parse { name: name.to_string(), message: err.to_string() })?;
        let mut scope = Scope::new();
        engine
            .run_ast_with_scope(&mut scope, &ast)
            .map_err(|err| ScriptLoadError::Execute { name: name.to_string(), message: err.to_string() })?;

        let update = resolve_update(&ast, &self.config.update_function);
        if update.is_none() {
            self.diagnostics.report(Diagnostic::UnresolvedCallback { name: self.config.update_function.clone() });
        }
        Ok(LoadedScript { engine, ast, scope, update })
    }
}

impl Drop for ScriptHost {
    fn drop(&mut self) {
        if let Phase::Initializing { name, .. } = &self.phase {
            tracing::debug!(script = %name, "abandoning pending script load");
        }
    }
}

fn resolve_update(ast: &AST, name: &str) -> Option<UpdateHandle> {
    ast.iter_functions()
        .find(|f| f.name == name && f.params.len() == 1)
        .map(|f| UpdateHandle { name: f.name.to_string() })
}

fn single_line(message: &str) -> String {
    message.lines().map(str::trim).filter(|line| !line.is_empty()).collect::<Vec<_>>().join(" ")
}
