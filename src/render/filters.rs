//! Declarative audio filter graphs
//!
//! A graph is a list of labelled chains. `Display` renders the exact
//! `-filter_complex` syntax the engine expects; the same graph always
//! renders to the same string.

use super::config::LoudnessTarget;
use std::fmt;

/// Time window a filter is active in (stream time of its chain)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Timeline {
    From(f64),
    Until(f64),
    Between(f64, f64),
}

impl fmt::Display for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timeline::From(t) => write!(f, "gte(t,{:.3})", t),
            Timeline::Until(t) => write!(f, "lt(t,{:.3})", t),
            Timeline::Between(a, b) => write!(f, "between(t,{:.3},{:.3})", a, b),
        }
    }
}

/// Gain curve of a crossfade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeCurve {
    /// Linear
    Tri,
    /// Quarter sine, equal-power-like
    Qsin,
    Exp,
}

impl FadeCurve {
    fn name(&self) -> &'static str {
        match self {
            FadeCurve::Tri => "tri",
            FadeCurve::Qsin => "qsin",
            FadeCurve::Exp => "exp",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Trim { start: Option<f64>, end: Option<f64> },
    ResetTimestamps,
    Format { sample_rate: u32, channels: u32 },
    Loudnorm(LoudnessTarget),
    Tempo(f64),
    Highpass { frequency: f64, enable: Option<Timeline> },
    Lowpass { frequency: f64, enable: Option<Timeline> },
    FadeIn { start: f64, duration: f64 },
    FadeOut { start: f64, duration: f64 },
    /// Two taps at `delay_ms` and twice that
    Echo { delay_ms: f64, decay: f64 },
    Crossfade { duration: f64, curve: FadeCurve },
    Concat { inputs: usize },
    Silence { duration: f64, sample_rate: u32, channels: u32 },
    Split { outputs: usize },
}

/// `atempo` factors whose product is `ratio`, each within the filter's range
fn tempo_factors(ratio: f64) -> Vec<f64> {
    let mut factors = Vec::new();
    let mut rest = ratio;
    while rest > 2.0 {
        factors.push(2.0);
        rest /= 2.0;
    }
    while rest < 0.5 {
        factors.push(0.5);
        rest /= 0.5;
    }
    factors.push(rest);
    factors
}

fn write_enable(f: &mut fmt::Formatter<'_>, enable: &Option<Timeline>) -> fmt::Result {
    match enable {
        Some(timeline) => write!(f, ":enable='{}'", timeline),
        None => Ok(()),
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Trim { start, end } => {
                f.write_str("atrim")?;
                let mut sep = '=';
                if let Some(start) = start {
                    write!(f, "{}start={:.3}", sep, start)?;
                    sep = ':';
                }
                if let Some(end) = end {
                    write!(f, "{}end={:.3}", sep, end)?;
                }
                Ok(())
            }
            Filter::ResetTimestamps => f.write_str("asetpts=PTS-STARTPTS"),
            Filter::Format {
                sample_rate,
                channels,
            } => write!(
                f,
                "aformat=sample_fmts=fltp:sample_rates={}:channel_layouts={}",
                sample_rate,
                if *channels == 1 { "mono" } else { "stereo" }
            ),
            Filter::Loudnorm(target) => write!(
                f,
                "loudnorm=I={:.1}:TP={:.1}:LRA={:.1}",
                target.integrated, target.true_peak, target.range
            ),
            Filter::Tempo(ratio) => {
                let parts: Vec<String> = tempo_factors(*ratio)
                    .iter()
                    .map(|r| format!("atempo={:.6}", r))
                    .collect();
                f.write_str(&parts.join(","))
            }
            Filter::Highpass { frequency, enable } => {
                write!(f, "highpass=f={:.0}", frequency)?;
                write_enable(f, enable)
            }
            Filter::Lowpass { frequency, enable } => {
                write!(f, "lowpass=f={:.0}", frequency)?;
                write_enable(f, enable)
            }
            Filter::FadeIn { start, duration } => {
                write!(f, "afade=t=in:st={:.3}:d={:.3}", start, duration)
            }
            Filter::FadeOut { start, duration } => {
                write!(f, "afade=t=out:st={:.3}:d={:.3}", start, duration)
            }
            Filter::Echo { delay_ms, decay } => write!(
                f,
                "aecho=0.8:0.7:{:.0}|{:.0}:{:.2}|{:.2}",
                delay_ms,
                delay_ms * 2.0,
                decay,
                decay * decay
            ),
            Filter::Crossfade { duration, curve } => write!(
                f,
                "acrossfade=d={:.3}:c1={}:c2={}",
                duration,
                curve.name(),
                curve.name()
            ),
            Filter::Concat { inputs } => write!(f, "concat=n={}:v=0:a=1", inputs),
            Filter::Silence {
                duration,
                sample_rate,
                channels,
            } => {
                let zeros = vec!["0"; (*channels).max(1) as usize].join("|");
                write!(f, "aevalsrc={}:d={:.3}:s={}", zeros, duration, sample_rate)
            }
            Filter::Split { outputs } => write!(f, "asplit={}", outputs),
        }
    }
}

/// `[in]...filter,filter...[out]...`
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub inputs: Vec<String>,
    pub filters: Vec<Filter>,
    pub outputs: Vec<String>,
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for input in &self.inputs {
            write!(f, "[{}]", input)?;
        }
        let filters: Vec<String> = self.filters.iter().map(|x| x.to_string()).collect();
        f.write_str(&filters.join(","))?;
        for output in &self.outputs {
            write!(f, "[{}]", output)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterGraph {
    chains: Vec<Chain>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chain with a single output label
    pub fn chain(&mut self, inputs: &[&str], filters: Vec<Filter>, output: &str) -> &mut Self {
        self.chain_multi(inputs, filters, &[output])
    }

    pub fn chain_multi(&mut self, inputs: &[&str], filters: Vec<Filter>, outputs: &[&str]) -> &mut Self {
        self.chains.push(Chain {
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            filters,
            outputs: outputs.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Label of the graph's final output
    pub fn output_label(&self) -> Option<&str> {
        self.chains
            .last()
            .and_then(|c| c.outputs.last())
            .map(|s| s.as_str())
    }

    /// Whether any chain uses a filter matching `predicate`
    pub fn contains(&self, predicate: impl Fn(&Filter) -> bool) -> bool {
        self.chains.iter().flat_map(|c| &c.filters).any(predicate)
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chains: Vec<String> = self.chains.iter().map(|c| c.to_string()).collect();
        f.write_str(&chains.join(";"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_syntax() {
        assert_eq!(
            Filter::Trim {
                start: Some(2.0),
                end: None
            }
            .to_string(),
            "atrim=start=2.000"
        );
        assert_eq!(
            Filter::Trim {
                start: None,
                end: Some(178.0)
            }
            .to_string(),
            "atrim=end=178.000"
        );
        assert_eq!(
            Filter::Highpass {
                frequency: 250.0,
                enable: Some(Timeline::From(12.5))
            }
            .to_string(),
            "highpass=f=250:enable='gte(t,12.500)'"
        );
        assert_eq!(
            Filter::Crossfade {
                duration: 8.0,
                curve: FadeCurve::Tri
            }
            .to_string(),
            "acrossfade=d=8.000:c1=tri:c2=tri"
        );
        assert_eq!(
            Filter::Loudnorm(LoudnessTarget::default()).to_string(),
            "loudnorm=I=-14.0:TP=-1.0:LRA=11.0"
        );
        assert_eq!(
            Filter::Silence {
                duration: 0.5,
                sample_rate: 44100,
                channels: 2
            }
            .to_string(),
            "aevalsrc=0|0:d=0.500:s=44100"
        );
    }

    #[test]
    fn test_tempo_chain() {
        assert_eq!(Filter::Tempo(1.02).to_string(), "atempo=1.020000");
        assert_eq!(Filter::Tempo(3.0).to_string(), "atempo=2.000000,atempo=1.500000");
        assert_eq!(Filter::Tempo(0.3).to_string(), "atempo=0.500000,atempo=0.600000");
    }

    #[test]
    fn test_graph_rendering() {
        let mut graph = FilterGraph::new();
        graph
            .chain(&["0:a"], vec![Filter::ResetTimestamps], "a")
            .chain(&["1:a"], vec![Filter::ResetTimestamps], "b")
            .chain(&["a", "b"], vec![Filter::Concat { inputs: 2 }], "out");
        assert_eq!(
            graph.to_string(),
            "[0:a]asetpts=PTS-STARTPTS[a];[1:a]asetpts=PTS-STARTPTS[b];[a][b]concat=n=2:v=0:a=1[out]"
        );
        assert_eq!(graph.output_label(), Some("out"));
        assert!(graph.contains(|f| matches!(f, Filter::Concat { .. })));
    }
}
