//! sfg - Signal-flow graph transfer function calculator
//!
//! Builds a graph from edge definitions, applies Mason's gain formula and
//! prints the symbolic and numeric transfer function.
//!
//! # Usage
//!
//! ```bash
//! sfg -e in:x:1 -e x:out:"1/(s*T)" -e out:x:-1 -i in -o out -p T=0.5 --eval 1
//! ```

use clap::Parser;
use num_complex::Complex64;
use sfg_core::{
    error::{Result, SfgError},
    graph::{Graph, NodeId},
    rational::poly_to_expr,
    Pipeline, PipelineChange,
};

/// Signal-flow graph transfer function calculator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Edge definition; nodes are created on first use
    #[arg(short, long = "edge", value_name = "FROM:TO:GAIN", required = true)]
    edges: Vec<String>,

    /// Input node name
    #[arg(short, long)]
    input: String,

    /// Output node name
    #[arg(short, long)]
    output: String,

    /// Symbolic substitution, applied before limits; `oo` marks an ideal gain
    #[arg(long = "sub", value_name = "NAME=EXPR")]
    substitutions: Vec<String>,

    /// Numeric parameter value
    #[arg(short, long = "param", value_name = "NAME=VALUE")]
    params: Vec<String>,

    /// Evaluate the transfer function at this (real) value of s
    #[arg(long, value_name = "S")]
    eval: Option<f64>,
}

fn split_assignment(text: &str) -> Result<(&str, &str)> {
    text.split_once('=')
        .map(|(name, value)| (name.trim(), value.trim()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| SfgError::invalid_argument(text, "expected NAME=VALUE"))
}

fn node(graph: &mut Graph, name: &str) -> NodeId {
    match graph.find_node(name) {
        Some(id) => id,
        None => graph.add_node(name),
    }
}

fn build_graph(edges: &[String]) -> Result<Graph> {
    let mut graph = Graph::new();
    for def in edges {
        let parts: Vec<&str> = def.splitn(3, ':').collect();
        let (from, to, gain) = match parts.as_slice() {
            [from, to, gain] => (*from, *to, *gain),
            _ => return Err(SfgError::invalid_argument(def.as_str(), "expected FROM:TO:GAIN")),
        };
        let from = node(&mut graph, from.trim());
        let to = node(&mut graph, to.trim());
        graph.add_edge_parsed(from, to, gain)?;
    }
    Ok(graph)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let graph = build_graph(&args.edges)?;
    let input = graph
        .find_node(&args.input)
        .ok_or_else(|| SfgError::node_not_found(args.input.as_str()))?;
    let output = graph
        .find_node(&args.output)
        .ok_or_else(|| SfgError::node_not_found(args.output.as_str()))?;

    let mut pipeline = Pipeline::new(graph);
    pipeline.set_io(input, output)?;
    for sub in &args.substitutions {
        let (name, text) = split_assignment(sub)?;
        pipeline.substitutions_mut().set_parsed(name, text)?;
    }
    for param in &args.params {
        let (name, value) = split_assignment(param)?;
        let value: f64 = value
            .parse()
            .map_err(|_| SfgError::invalid_argument(param.as_str(), "value is not a number"))?;
        pipeline.parameters_mut().set_literal(name, value);
    }

    pipeline.update(PipelineChange::GraphChanged)?;

    if let Some(gain) = pipeline.gain() {
        println!("gain:        {}", gain);
    }
    if let Some(limit) = pipeline.limit() {
        println!("substituted: {}", limit);
    }
    if let Some(rational) = pipeline.rational() {
        let var = pipeline.config().variable.as_str();
        println!("numerator:   {}", poly_to_expr(&rational.num, var));
        println!("denominator: {}", poly_to_expr(&rational.den, var));
    }
    for (name, value) in pipeline.parameters().iter() {
        println!("param {} = {}", name, value);
    }

    if let Some(tf) = pipeline.transfer_function_mut() {
        println!("factor:      {}", tf.factor());
        for zero in tf.zeros()? {
            println!("zero:        {}", zero);
        }
        for pole in tf.poles()? {
            println!("pole:        {}", pole);
        }
        if let Some(s) = args.eval {
            println!("H({}) = {}", s, tf.eval(Complex64::new(s, 0.0)));
        }
    }

    Ok(())
}
