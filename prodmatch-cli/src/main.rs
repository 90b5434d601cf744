use clap::Parser;
use prodmatch::image::io::load_image;
use prodmatch::{
    BonusLevel, CancellationToken, ComparisonReport, ConsistencyBonus, Engine, EngineConfig,
    FeatureConfig, FusionConfig, FusionWeights, HistogramConfig, MatchResult, NormalizeConfig,
    RansacConfig, SearchConfig, SelectorConfig, SsimConfig, TemplateConfig,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "prodmatch CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for performance profiling.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct NormalizeConfigJson {
    working_width: usize,
    working_height: usize,
}

impl Default for NormalizeConfigJson {
    fn default() -> Self {
        let cfg = NormalizeConfig::default();
        Self {
            working_width: cfg.working_width,
            working_height: cfg.working_height,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct TemplateConfigJson {
    scales: Vec<f32>,
    max_levels: usize,
    beam_width: usize,
    coarse_topk: usize,
    nms_radius: usize,
    roi_radius: usize,
}

impl Default for TemplateConfigJson {
    fn default() -> Self {
        let cfg = TemplateConfig::default();
        Self {
            scales: cfg.scales,
            max_levels: cfg.search.max_levels,
            beam_width: cfg.search.beam_width,
            coarse_topk: cfg.search.coarse_topk,
            nms_radius: cfg.search.nms_radius,
            roi_radius: cfg.search.roi_radius,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct FeatureConfigJson {
    fast_threshold: u8,
    max_keypoints: usize,
    octaves: usize,
    ratio: f32,
    max_distance: u32,
    min_keypoints: usize,
}

impl Default for FeatureConfigJson {
    fn default() -> Self {
        let cfg = FeatureConfig::default();
        Self {
            fast_threshold: cfg.fast_threshold,
            max_keypoints: cfg.max_keypoints,
            octaves: cfg.octaves,
            ratio: cfg.ratio,
            max_distance: cfg.max_distance,
            min_keypoints: cfg.min_keypoints,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RansacConfigJson {
    reprojection_threshold: f32,
    iterations: usize,
    min_inliers: usize,
    seed: u64,
}

impl Default for RansacConfigJson {
    fn default() -> Self {
        let cfg = RansacConfig::default();
        Self {
            reprojection_threshold: cfg.reprojection_threshold,
            iterations: cfg.iterations,
            min_inliers: cfg.min_inliers,
            seed: cfg.seed,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SsimConfigJson {
    window: usize,
    stride: usize,
}

impl Default for SsimConfigJson {
    fn default() -> Self {
        let cfg = SsimConfig::default();
        Self {
            window: cfg.window,
            stride: cfg.stride,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct HistogramConfigJson {
    hue_bins: usize,
    saturation_bins: usize,
    value_bins: usize,
}

impl Default for HistogramConfigJson {
    fn default() -> Self {
        let cfg = HistogramConfig::default();
        Self {
            hue_bins: cfg.hue_bins,
            saturation_bins: cfg.saturation_bins,
            value_bins: cfg.value_bins,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct WeightsJson {
    template: f32,
    feature: f32,
    structural: f32,
    histogram: f32,
}

impl Default for WeightsJson {
    fn default() -> Self {
        Self {
            template: 60.0,
            feature: 25.0,
            structural: 10.0,
            histogram: 5.0,
        }
    }
}

fn default_two() -> f32 {
    1.15
}

fn default_three() -> f32 {
    1.25
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum BonusJson {
    Disabled,
    Tiered {
        #[serde(default = "default_two")]
        two: f32,
        #[serde(default = "default_three")]
        three: f32,
    },
}

impl Default for BonusJson {
    fn default() -> Self {
        BonusJson::Tiered {
            two: default_two(),
            three: default_three(),
        }
    }
}

impl From<BonusJson> for ConsistencyBonus {
    fn from(value: BonusJson) -> Self {
        match value {
            BonusJson::Disabled => ConsistencyBonus::Disabled,
            BonusJson::Tiered { two, three } => ConsistencyBonus::Tiered { two, three },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct FusionConfigJson {
    weights: WeightsJson,
    high_threshold: f32,
    bonus: BonusJson,
}

impl Default for FusionConfigJson {
    fn default() -> Self {
        Self {
            weights: WeightsJson::default(),
            high_threshold: FusionConfig::default().threshold(),
            bonus: BonusJson::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    reference_path: String,
    candidate_paths: Vec<String>,
    output_path: Option<String>,
    match_threshold: f32,
    geometric_verification: bool,
    parallel: bool,
    normalize: NormalizeConfigJson,
    template: TemplateConfigJson,
    features: FeatureConfigJson,
    ransac: RansacConfigJson,
    ssim: SsimConfigJson,
    histogram: HistogramConfigJson,
    fusion: FusionConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reference_path: String::new(),
            candidate_paths: Vec::new(),
            output_path: None,
            match_threshold: 70.0,
            geometric_verification: false,
            parallel: false,
            normalize: NormalizeConfigJson::default(),
            template: TemplateConfigJson::default(),
            features: FeatureConfigJson::default(),
            ransac: RansacConfigJson::default(),
            ssim: SsimConfigJson::default(),
            histogram: HistogramConfigJson::default(),
            fusion: FusionConfigJson::default(),
        }
    }
}

impl Config {
    fn engine_config(self) -> Result<EngineConfig, Box<dyn std::error::Error>> {
        let w = self.fusion.weights;
        let weights = FusionWeights::new(w.template, w.feature, w.structural, w.histogram)?;
        let fusion = FusionConfig::new(
            weights,
            self.fusion.high_threshold,
            self.fusion.bonus.into(),
        )?;

        Ok(EngineConfig {
            normalize: NormalizeConfig {
                working_width: self.normalize.working_width,
                working_height: self.normalize.working_height,
            },
            template: TemplateConfig {
                scales: self.template.scales,
                search: SearchConfig {
                    max_levels: self.template.max_levels,
                    beam_width: self.template.beam_width,
                    coarse_topk: self.template.coarse_topk,
                    nms_radius: self.template.nms_radius,
                    roi_radius: self.template.roi_radius,
                    ..SearchConfig::default()
                },
            },
            features: FeatureConfig {
                fast_threshold: self.features.fast_threshold,
                max_keypoints: self.features.max_keypoints,
                octaves: self.features.octaves,
                ratio: self.features.ratio,
                max_distance: self.features.max_distance,
                min_keypoints: self.features.min_keypoints,
                ..FeatureConfig::default()
            },
            ransac: RansacConfig {
                reprojection_threshold: self.ransac.reprojection_threshold,
                iterations: self.ransac.iterations,
                min_inliers: self.ransac.min_inliers,
                seed: self.ransac.seed,
            },
            ssim: SsimConfig {
                window: self.ssim.window,
                stride: self.ssim.stride,
            },
            histogram: HistogramConfig {
                hue_bins: self.histogram.hue_bins,
                saturation_bins: self.histogram.saturation_bins,
                value_bins: self.histogram.value_bins,
            },
            fusion,
            selector: SelectorConfig {
                parallel: self.parallel,
                ..SelectorConfig::default()
            },
            geometric_verification: self.geometric_verification,
        })
    }
}

#[derive(Debug, Serialize)]
struct MetricsRecord {
    template: f32,
    feature: f32,
    structural: f32,
    histogram: f32,
}

#[derive(Debug, Serialize)]
struct ReportRecord {
    metrics: MetricsRecord,
    weighted: f32,
    fused: f32,
    high_count: usize,
    bonus: &'static str,
}

impl From<&ComparisonReport> for ReportRecord {
    fn from(value: &ComparisonReport) -> Self {
        use prodmatch::MetricKind;
        Self {
            metrics: MetricsRecord {
                template: value.metric(MetricKind::Template),
                feature: value.metric(MetricKind::Feature),
                structural: value.metric(MetricKind::Structural),
                histogram: value.metric(MetricKind::Histogram),
            },
            weighted: value.weighted,
            fused: value.fused,
            high_count: value.high_count,
            bonus: BonusLevel::name(value.bonus),
        }
    }
}

#[derive(Debug, Serialize)]
struct BestRecord {
    index: usize,
    id: String,
    score: f32,
    report: Option<ReportRecord>,
}

#[derive(Debug, Serialize)]
struct FailureRecord {
    index: usize,
    id: String,
    error: String,
}

#[derive(Debug, Serialize)]
struct Output {
    reference: String,
    is_match: bool,
    best: Option<BestRecord>,
    evaluated: usize,
    failures: Vec<FailureRecord>,
    cancelled: bool,
}

impl Output {
    fn new(result: &MatchResult, threshold: f32) -> Self {
        let best = match (result.candidate_index, &result.candidate_id) {
            (Some(index), Some(id)) => Some(BestRecord {
                index,
                id: id.clone(),
                score: result.score,
                report: result.report.as_ref().map(ReportRecord::from),
            }),
            _ => None,
        };
        Self {
            reference: result.reference_id.clone(),
            is_match: result.is_match(threshold),
            best,
            evaluated: result.evaluated,
            failures: result
                .failures
                .iter()
                .map(|f| FailureRecord {
                    index: f.index,
                    id: f.id.clone(),
                    error: f.error.to_string(),
                })
                .collect(),
            cancelled: result.cancelled,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("prodmatch=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.reference_path.is_empty() || config.candidate_paths.is_empty() {
        return Err("reference_path and candidate_paths must be set in the config".into());
    }
    if !(0.0..=100.0).contains(&config.match_threshold) {
        return Err("match_threshold must lie in [0, 100]".into());
    }

    let reference = load_image(&config.reference_path)?;
    let candidates = config
        .candidate_paths
        .iter()
        .map(load_image)
        .collect::<Result<Vec<_>, _>>()?;
    tracing::info!(candidates = candidates.len(), "loaded images");

    let output_path = config.output_path.clone();
    let threshold = config.match_threshold;
    let engine = Engine::new(config.engine_config()?)?;
    let result = engine.find_best_match(&reference, &candidates, &CancellationToken::new())?;

    let output = Output::new(&result, threshold);
    let json = serde_json::to_string_pretty(&output)?;

    match output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}
