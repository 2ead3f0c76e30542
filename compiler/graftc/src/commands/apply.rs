//! The `apply` command: run every overlay of a bundle over its classes.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use graft_diagnostic::emitter::TerminalEmitter;
use graft_diagnostic::{Diagnostic, DiagnosticConfig, DiagnosticQueue, DiagnosticSink};
use graft_ir::ClassNode;
use graft_mixin::{ClassReport, MergeSession, MixinConfig, SessionError, SharedRegistry};
use graft_model::MapClassSource;
use rayon::prelude::*;

use crate::bundle::{Bundle, ClassBundle};

/// Options accepted by `graftc apply`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Output file; stdout when absent.
    pub output: Option<PathBuf>,
    /// Overrides `MixinConfig::default_priority`.
    pub priority: Option<i32>,
    /// Missing overwrite targets are errors.
    pub strict_overwrite: bool,
    /// Process classes on the rayon pool.
    pub parallel: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        ApplyOptions {
            output: None,
            priority: None,
            strict_overwrite: false,
            parallel: true,
        }
    }
}

impl ApplyOptions {
    /// Layer the command-line flags over `base`.
    pub fn config(&self, base: MixinConfig) -> MixinConfig {
        let mut config = base;
        if let Some(priority) = self.priority {
            config.default_priority = priority;
        }
        if self.strict_overwrite {
            config.require_overwrite_targets = true;
        }
        config
    }
}

/// Parse the flags that follow `graftc apply <bundle>`.
///
/// Unknown flags are reported and skipped.
pub fn parse_apply_options(args: &[String]) -> ApplyOptions {
    let mut options = ApplyOptions::default();
    let mut args = args.iter();

    while let Some(arg) = args.next() {
        if arg == "-o" {
            match args.next() {
                Some(path) => options.output = Some(PathBuf::from(path)),
                None => eprintln!("warning: `-o` needs a path, writing to stdout"),
            }
        } else if let Some(path) = arg
            .strip_prefix("-o=")
            .or_else(|| arg.strip_prefix("--output="))
        {
            options.output = Some(PathBuf::from(path));
        } else if let Some(level) = arg.strip_prefix("--priority=") {
            match level.parse() {
                Ok(priority) => options.priority = Some(priority),
                Err(_) => eprintln!("warning: invalid priority '{level}', using the default"),
            }
        } else if arg == "--strict-overwrite" {
            options.strict_overwrite = true;
        } else if arg == "--no-parallel" {
            options.parallel = false;
        } else {
            eprintln!("warning: unknown option '{arg}'");
        }
    }

    options
}

/// Everything one `apply` run produced.
#[derive(Debug)]
pub struct ApplyOutcome {
    pub output: ClassBundle,
    /// One report per input class, in input order.
    pub reports: Vec<ClassReport>,
    /// Errors first, then warnings.
    pub diagnostics: Vec<Diagnostic>,
}

impl ApplyOutcome {
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_warning()).count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Run one merge session over a whole bundle.
///
/// Class tokens are reserved in input order before any class is merged, so
/// the tokens do not depend on thread scheduling.
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(classes = bundle.classes.len(), overlays = bundle.overlays.len())
)]
pub fn apply_bundle(bundle: Bundle, options: &ApplyOptions) -> Result<ApplyOutcome, SessionError> {
    let Bundle { classes, overlays } = bundle;
    let config = options.config(MixinConfig::from_env());
    let source: MapClassSource = classes.iter().cloned().collect();
    let queue = Arc::new(DiagnosticQueue::with_config(DiagnosticConfig::unlimited()));
    let sink: Arc<dyn DiagnosticSink> = Arc::<DiagnosticQueue>::clone(&queue);
    let session = MergeSession::new(config, SharedRegistry::new(), Arc::new(source), sink);

    for decl in overlays {
        session.register_overlay(decl);
    }
    session.finalize();

    for class in &classes {
        if !session.overlays_for(&class.name).is_empty() {
            session.registry().uid_for_class(&class.name)?;
        }
    }

    let process = |mut class: ClassNode| -> Result<(ClassNode, ClassReport), SessionError> {
        let name = class.name.clone();
        let report = session.process_class(&name, &mut class)?;
        Ok((class, report))
    };
    let processed = if options.parallel {
        classes
            .into_par_iter()
            .map(process)
            .collect::<Result<Vec<_>, _>>()?
    } else {
        classes
            .into_iter()
            .map(process)
            .collect::<Result<Vec<_>, _>>()?
    };

    let (classes, reports): (Vec<_>, Vec<_>) = processed.into_iter().unzip();
    tracing::debug!(
        transformed = reports.iter().filter(|r| r.result.is_transformed()).count(),
        "bundle applied"
    );
    Ok(ApplyOutcome {
        output: ClassBundle { classes },
        reports,
        diagnostics: queue.flush(),
    })
}

/// `graftc apply`: load, merge, write, and report. Exits with status 1 on any error.
pub fn apply_file(path: &str, options: &ApplyOptions) {
    let bundle = match Bundle::load(Path::new(path)) {
        Ok(bundle) => bundle,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    let colors = std::io::stderr().is_terminal();
    let mut emitter = TerminalEmitter::new(std::io::stderr(), colors);

    let outcome = match apply_bundle(bundle, options) {
        Ok(outcome) => outcome,
        Err(err) => {
            emitter.emit(&err.to_diagnostic());
            emitter.emit_summary(1, 0);
            emitter.flush();
            std::process::exit(1);
        }
    };

    emitter.emit_all(&outcome.diagnostics);
    emitter.emit_summary(outcome.error_count(), outcome.warning_count());
    emitter.flush();

    if let Err(err) = outcome.output.write(options.output.as_deref()) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
    if outcome.has_errors() {
        std::process::exit(1);
    }
}
