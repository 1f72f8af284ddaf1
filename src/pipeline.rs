//! Staged computation from a graph to a numeric transfer function.
//!
//! ```text
//! Graph ──mason──► gain ──substitute──► substituted ──limits──► limit
//!                                                                 │
//!          TransferFunction ◄──parameters── RationalExpr ◄──to_rational
//! ```
//!
//! Each stage caches its result. A change only recomputes the stage it
//! affects and everything after it.

use crate::error::{Result, SfgError};
use crate::expr::Expr;
use crate::graph::{Graph, NodeId};
use crate::numeric::{RootFinderConfig, TransferFunction};
use crate::rational::{apply_limits, to_rational, RationalExpr, DEFAULT_TF_VARIABLE};
use crate::rewrite::{RewriteConfig, OPTIMIZE};
use crate::vars::VarTable;

/// What changed since the last update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineChange {
    /// Nodes, edges, gains or the input/output selection.
    GraphChanged,
    /// Bindings of the substitution table.
    SubstitutionsChanged,
    /// Numeric parameter values.
    ParametersChanged,
}

/// Configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub rewrite: RewriteConfig,
    pub root_finder: RootFinderConfig,
    /// Variable of the rational function.
    pub variable: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rewrite: RewriteConfig::default(),
            root_finder: RootFinderConfig::default(),
            variable: DEFAULT_TF_VARIABLE.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rewrite(mut self, rewrite: RewriteConfig) -> Self {
        self.rewrite = rewrite;
        self
    }

    pub fn with_root_finder(mut self, root_finder: RootFinderConfig) -> Self {
        self.root_finder = root_finder;
        self
    }

    pub fn with_variable(mut self, variable: impl Into<String>) -> Self {
        self.variable = variable.into();
        self
    }
}

/// A graph together with its substitution and parameter tables and the
/// cached result of every stage.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    graph: Graph,
    input: Option<NodeId>,
    output: Option<NodeId>,
    substitutions: VarTable,
    parameters: VarTable,
    config: PipelineConfig,

    gain: Option<Expr>,
    substituted: Option<Expr>,
    limit: Option<Expr>,
    rational: Option<RationalExpr>,
    transfer: Option<TransferFunction>,
}

impl Pipeline {
    pub fn new(graph: Graph) -> Self {
        Self::with_config(graph, PipelineConfig::default())
    }

    pub fn with_config(graph: Graph, config: PipelineConfig) -> Self {
        Self {
            graph,
            config,
            ..Self::default()
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Mutable graph access. Follow up with [`PipelineChange::GraphChanged`].
    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    /// Select the nodes the gain is computed between.
    pub fn set_io(&mut self, input: NodeId, output: NodeId) -> Result<()> {
        self.graph.validate_io(input, output)?;
        self.input = Some(input);
        self.output = Some(output);
        Ok(())
    }

    pub fn io(&self) -> Option<(NodeId, NodeId)> {
        self.input.zip(self.output)
    }

    pub fn substitutions(&self) -> &VarTable {
        &self.substitutions
    }

    pub fn substitutions_mut(&mut self) -> &mut VarTable {
        &mut self.substitutions
    }

    pub fn parameters(&self) -> &VarTable {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut VarTable {
        &mut self.parameters
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Simplified Mason gain.
    pub fn gain(&self) -> Option<&Expr> {
        self.gain.as_ref()
    }

    /// Gain with all finite substitutions inserted.
    pub fn substituted(&self) -> Option<&Expr> {
        self.substituted.as_ref()
    }

    /// Substituted gain with every `oo`-bound symbol taken to its limit.
    pub fn limit(&self) -> Option<&Expr> {
        self.limit.as_ref()
    }

    pub fn rational(&self) -> Option<&RationalExpr> {
        self.rational.as_ref()
    }

    pub fn transfer_function(&self) -> Option<&TransferFunction> {
        self.transfer.as_ref()
    }

    /// Mutable access, for the cached pole and zero queries.
    pub fn transfer_function_mut(&mut self) -> Option<&mut TransferFunction> {
        self.transfer.as_mut()
    }

    /// Recompute the stages affected by `change`.
    ///
    /// On failure the failing stage and every later one are left empty.
    pub fn update(&mut self, change: PipelineChange) -> Result<()> {
        log::debug!("pipeline update: {:?}", change);
        let result = match change {
            PipelineChange::GraphChanged => self
                .solve_graph()
                .and_then(|_| self.substitute())
                .and_then(|_| self.evaluate()),
            PipelineChange::SubstitutionsChanged => self.substitute().and_then(|_| self.evaluate()),
            PipelineChange::ParametersChanged => self.evaluate(),
        };
        if let Err(e) = &result {
            log::warn!("pipeline stage failed: {}", e);
        }
        result
    }

    fn solve_graph(&mut self) -> Result<()> {
        self.gain = None;
        self.clear_symbolic();

        let (input, output) = self
            .io()
            .ok_or_else(|| SfgError::invalid_topology("input and output nodes are not selected"))?;
        self.graph.validate_io(input, output)?;

        let mut gain = self.graph.mason(input, output)?;
        OPTIMIZE.run_expr(&mut gain, &self.config.rewrite)?;
        log::debug!("gain: {}", gain);
        self.gain = Some(gain);
        Ok(())
    }

    fn substitute(&mut self) -> Result<()> {
        self.clear_symbolic();
        let mut expr = match &self.gain {
            Some(gain) => gain.clone(),
            None => return Ok(()),
        };

        self.substitutions.insert_substitutions(&mut expr)?;
        OPTIMIZE.run_expr(&mut expr, &self.config.rewrite)?;
        let limit = apply_limits(&expr, &self.substitutions)?;
        self.substituted = Some(expr);

        let conversion = to_rational(&limit, &self.config.variable);
        self.limit = Some(limit);
        let mut rational = conversion?;
        for coeff in rational.coefficient_exprs_mut() {
            OPTIMIZE.run_expr(coeff, &self.config.rewrite)?;
        }

        // keep values of surviving parameters, default new ones, drop the rest
        self.parameters.reset_visited();
        for coeff in rational.coefficient_exprs() {
            self.parameters.populate(coeff.pool(), coeff.root());
        }
        let dropped = self.parameters.erase_unvisited();
        log::debug!(
            "rational function of degree {:?}, {} parameters ({} dropped)",
            rational.degree(),
            self.parameters.len(),
            dropped
        );
        self.rational = Some(rational);
        Ok(())
    }

    fn evaluate(&mut self) -> Result<()> {
        self.transfer = None;
        if let Some(rational) = &self.rational {
            let tf = TransferFunction::from_symbolic(rational, &self.parameters)?
                .with_root_finder(self.config.root_finder.clone());
            self.transfer = Some(tf);
        }
        Ok(())
    }

    fn clear_symbolic(&mut self) {
        self.substituted = None;
        self.limit = None;
        self.rational = None;
        self.transfer = None;
    }
}
