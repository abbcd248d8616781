//! dimred - UMAP / t-SNE embeddings of CSV simulation output
//!
//! Loads a table, strips structural columns, embeds the remaining features
//! and shows them as a colored scatter.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use dimred::config::RunConfig;
use dimred::data::Domain;
use dimred::embed::{Algorithm, Params};

#[derive(Parser, Debug)]
#[command(name = "dimred")]
#[command(about = "Dimensionality reduction and scatter plots for CSV simulation output", version)]
struct Cli {
    /// Input CSV file; a file dialog opens when neither this nor the config gives one
    input: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dimensionality of the simulation domain (2 or 3)
    #[arg(short, long, value_parser = parse_dim)]
    dim: Option<Domain>,

    /// Embedding algorithm: umap or tsne
    #[arg(short, long)]
    algorithm: Option<Algorithm>,

    /// Skip feature standardization
    #[arg(long)]
    no_scale: bool,

    /// Algorithm parameter as key=value (repeatable)
    #[arg(short, long = "param", value_parser = parse_param)]
    params: Vec<(String, f64)>,

    /// Column used to color the points
    #[arg(long)]
    color_by: Option<String>,

    /// Fixed color range
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"], allow_negative_numbers = true)]
    color_range: Option<Vec<f64>>,

    /// Draw uniform points
    #[arg(long, conflicts_with_all = ["color_by", "color_range"])]
    no_color: bool,

    /// Save the scatter as a PNG
    #[arg(long)]
    save_png: Option<PathBuf>,

    /// Open the saved PNG with the system viewer
    #[arg(long, requires = "save_png")]
    open: bool,

    /// Save the embedding coordinates as CSV
    #[arg(long)]
    save_embedding: Option<PathBuf>,

    /// Do not open the interactive window
    #[arg(long)]
    no_window: bool,

    /// Verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_dim(s: &str) -> Result<Domain, String> {
    let dim: u8 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    Domain::try_from(dim).map_err(|e| e.to_string())
}

fn parse_param(s: &str) -> Result<(String, f64), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("parameter '{key}' needs a numeric value, got '{value}'"))?;
    Ok((key.trim().to_string(), value))
}

impl Cli {
    /// Apply command line overrides on top of `config`.
    fn apply(self, mut config: RunConfig) -> RunConfig {
        if self.input.is_some() {
            config.input = self.input;
        }
        if let Some(dim) = self.dim {
            config.dim = dim;
        }
        if let Some(algorithm) = self.algorithm {
            if algorithm != config.algorithm && config.params.is_some() {
                log::warn!("Algorithm changed to {algorithm}; ignoring parameters from the config file");
                config.params = None;
            }
            config.algorithm = algorithm;
        }
        if self.no_scale {
            config.scale = false;
        }
        if !self.params.is_empty() {
            let mut params: Params = config.effective_params();
            params.extend(self.params);
            config.params = Some(params);
        }
        if self.no_color {
            config.color.column = None;
            config.color.range = None;
        }
        if let Some(column) = self.color_by {
            config.color.column = Some(column);
        }
        if self.color_range.is_some() {
            config.color.range = self.color_range;
        }
        if self.save_png.is_some() {
            config.output.save_png = self.save_png;
        }
        if self.open {
            config.output.open_png = true;
        }
        if self.save_embedding.is_some() {
            config.output.save_embedding = self.save_embedding;
        }
        if self.no_window {
            config.output.show_window = false;
        }
        config
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        })
        .parse_default_env()
        .format_timestamp_secs()
        .init();

    let base = match &cli.config {
        Some(path) => {
            let config = RunConfig::from_json(path)?;
            log::info!("Loaded config from: {}", path.display());
            config
        }
        None => RunConfig::default(),
    };
    let mut config = cli.apply(base);

    if config.input.is_none() {
        config.input = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file();
    }
    if config.input.is_none() {
        bail!("no input file");
    }

    dimred::pipeline::run(&config).context("dimred run failed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("dimred").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn parses_params() {
        assert_eq!(parse_param("n_neighbors=20"), Ok(("n_neighbors".to_string(), 20.0)));
        assert_eq!(parse_param(" min_dist = 0.2"), Ok(("min_dist".to_string(), 0.2)));
        assert!(parse_param("n_neighbors").is_err());
        assert!(parse_param("n_neighbors=many").is_err());
    }

    #[test]
    fn rejects_bad_dim() {
        assert!(Cli::try_parse_from(["dimred", "--dim", "4"]).is_err());
        assert!(Cli::try_parse_from(["dimred", "--algorithm", "pca"]).is_err());
    }

    #[test]
    fn no_args_keeps_config_defaults() {
        let config = parse(&[]).apply(RunConfig::default());
        assert_eq!(config, RunConfig::default());
    }

    #[test]
    fn overrides_apply_on_top_of_config() {
        let cli = parse(&[
            "flow.csv",
            "--dim",
            "3",
            "--no-scale",
            "-p",
            "n_neighbors=5",
            "--color-range",
            "-1",
            "1",
            "--no-window",
        ]);

        let config = cli.apply(RunConfig::default());

        assert_eq!(config.input, Some(PathBuf::from("flow.csv")));
        assert_eq!(config.dim, Domain::Volume);
        assert!(!config.scale);
        let params = config.effective_params();
        assert_eq!(params.get("n_neighbors"), Some(&5.0));
        assert_eq!(params.get("min_dist"), Some(&0.2));
        assert_eq!(config.color.range, Some(vec![-1.0, 1.0]));
        assert!(!config.output.show_window);
    }

    #[test]
    fn switching_algorithm_resets_config_params() {
        let base = RunConfig {
            params: Some(RunConfig::default_params(Algorithm::Umap)),
            ..Default::default()
        };

        let config = parse(&["--algorithm", "tsne", "-p", "perplexity=5"]).apply(base);

        assert_eq!(config.algorithm, Algorithm::Tsne);
        let params = config.effective_params();
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("perplexity"), Some(&5.0));
    }

    #[test]
    fn no_color_clears_color() {
        let config = parse(&["--no-color"]).apply(RunConfig::default());
        assert_eq!(config.color.column, None);
        assert_eq!(config.color.range, None);
        assert!(Cli::try_parse_from(["dimred", "--no-color", "--color-by", "Phi"]).is_err());
    }
}
