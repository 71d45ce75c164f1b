//! One filter graph builder per transition type
//!
//! Input 0 is the running mix (intermediate WAV), input 1 the raw incoming
//! track. Every graph ends in the `out` label.

use super::config::RenderConfig;
use super::filters::{FadeCurve, Filter, FilterGraph, Timeline};
use super::layout::StepLayout;
use crate::model::TransitionType;

pub const OUTPUT_LABEL: &str = "out";

/// Bass cut used by the EQ swap
const BASS_CUT_HZ: f64 = 250.0;
const SWEEP_HIGHPASS_HZ: [f64; 3] = [200.0, 800.0, 2500.0];
const SWEEP_LOWPASS_HZ: [f64; 3] = [600.0, 2500.0, 8000.0];
const ECHO_DECAY: f64 = 0.5;
/// Fade-in after the silence of a drop
const DROP_FADE_IN: f64 = 0.05;

fn format(config: &RenderConfig) -> Filter {
    Filter::Format {
        sample_rate: config.sample_rate,
        channels: config.channels,
    }
}

/// First track: normalized, from the start
pub fn first_track(config: &RenderConfig) -> FilterGraph {
    let mut graph = FilterGraph::new();
    graph.chain(
        &["0:a"],
        vec![Filter::Loudnorm(config.loudness), format(config)],
        OUTPUT_LABEL,
    );
    graph
}

/// Plain concatenation of the running mix and the whole incoming track
pub fn fallback_concat(config: &RenderConfig) -> FilterGraph {
    let mut graph = FilterGraph::new();
    graph
        .chain(&["0:a"], vec![format(config)], "a")
        .chain(
            &["1:a"],
            vec![Filter::Loudnorm(config.loudness), format(config)],
            "b",
        )
        .chain(&["a", "b"], vec![Filter::Concat { inputs: 2 }], OUTPUT_LABEL);
    graph
}

/// Graph for one pairwise step; `beat_seconds` is a beat of the outgoing track
pub fn transition_graph(
    kind: TransitionType,
    layout: &StepLayout,
    config: &RenderConfig,
    beat_seconds: f64,
) -> FilterGraph {
    let mut graph = FilterGraph::new();
    prepare_sides(&mut graph, layout, config);
    match kind {
        TransitionType::Crossfade => blend(&mut graph, layout, FadeCurve::Tri),
        TransitionType::HarmonicBlend => blend(&mut graph, layout, FadeCurve::Qsin),
        TransitionType::EqSwap => eq_swap(&mut graph, layout),
        TransitionType::FilterSweep => filter_sweep(&mut graph, layout),
        TransitionType::EchoOut => echo_out(&mut graph, layout, beat_seconds),
        TransitionType::Drop => drop_cut(&mut graph, layout, config),
    }
    graph
}

/// `[a]`: running mix cut at the head end; `[b]`: incoming from its start
/// point, normalized and stretched
fn prepare_sides(graph: &mut FilterGraph, layout: &StepLayout, config: &RenderConfig) {
    graph.chain(
        &["0:a"],
        vec![
            Filter::Trim {
                start: None,
                end: Some(layout.head_end),
            },
            Filter::ResetTimestamps,
            format(config),
        ],
        "a",
    );

    let mut incoming = vec![
        Filter::Trim {
            start: Some(layout.incoming_start),
            end: None,
        },
        Filter::ResetTimestamps,
        Filter::Loudnorm(config.loudness),
    ];
    if (layout.tempo_ratio - 1.0).abs() > 1e-6 {
        incoming.push(Filter::Tempo(layout.tempo_ratio));
    }
    incoming.push(format(config));
    graph.chain(&["1:a"], incoming, "b");
}

/// Join `[left]` and `[right]` with the layout's overlap, or butt-join when
/// there is none
fn join(graph: &mut FilterGraph, left: &str, right: &str, layout: &StepLayout, curve: FadeCurve) {
    let filter = if layout.crossfades() {
        Filter::Crossfade {
            duration: layout.overlap,
            curve,
        }
    } else {
        Filter::Concat { inputs: 2 }
    };
    graph.chain(&[left, right], vec![filter], OUTPUT_LABEL);
}

fn blend(graph: &mut FilterGraph, layout: &StepLayout, curve: FadeCurve) {
    join(graph, "a", "b", layout, curve);
}

/// Outgoing loses its bass halfway through the overlap, incoming gains it
fn eq_swap(graph: &mut FilterGraph, layout: &StepLayout) {
    let half = layout.overlap / 2.0;
    graph
        .chain(
            &["a"],
            vec![Filter::Highpass {
                frequency: BASS_CUT_HZ,
                enable: Some(Timeline::From(layout.effect_start + half)),
            }],
            "a2",
        )
        .chain(
            &["b"],
            vec![Filter::Highpass {
                frequency: BASS_CUT_HZ,
                enable: Some(Timeline::Until(half)),
            }],
            "b2",
        );
    join(graph, "a2", "b2", layout, FadeCurve::Tri);
}

/// Staged high-pass on the way out, staged low-pass opening on the way in
fn filter_sweep(graph: &mut FilterGraph, layout: &StepLayout) {
    let stage = layout.overlap / SWEEP_HIGHPASS_HZ.len() as f64;
    let outgoing = SWEEP_HIGHPASS_HZ
        .iter()
        .enumerate()
        .map(|(i, hz)| Filter::Highpass {
            frequency: *hz,
            enable: Some(Timeline::From(layout.effect_start + stage * i as f64)),
        })
        .collect();
    let incoming = SWEEP_LOWPASS_HZ
        .iter()
        .enumerate()
        .map(|(i, hz)| Filter::Lowpass {
            frequency: *hz,
            enable: Some(Timeline::Until(stage * (i + 1) as f64)),
        })
        .collect();
    graph
        .chain(&["a"], outgoing, "a2")
        .chain(&["b"], incoming, "b2");
    join(graph, "a2", "b2", layout, FadeCurve::Tri);
}

/// Beat-synced echo over the outgoing tail, faded out, then a short crossfade.
/// The decay ringing past the end of the input is cut off so the outgoing
/// side keeps its planned length.
fn echo_out(graph: &mut FilterGraph, layout: &StepLayout, beat_seconds: f64) {
    let echo = Filter::Echo {
        delay_ms: (beat_seconds * 1000.0).clamp(50.0, 2000.0),
        decay: ECHO_DECAY,
    };
    let fade = Filter::FadeOut {
        start: 0.0,
        duration: layout.effect_len,
    };
    if layout.effect_start > 0.01 {
        graph
            .chain_multi(&["a"], vec![Filter::Split { outputs: 2 }], &["ah", "at"])
            .chain(
                &["ah"],
                vec![
                    Filter::Trim {
                        start: None,
                        end: Some(layout.effect_start),
                    },
                    Filter::ResetTimestamps,
                ],
                "a1",
            )
            .chain(
                &["at"],
                vec![
                    Filter::Trim {
                        start: Some(layout.effect_start),
                        end: None,
                    },
                    Filter::ResetTimestamps,
                    echo,
                    fade,
                    Filter::Trim {
                        start: None,
                        end: Some(layout.effect_len),
                    },
                ],
                "a2",
            )
            .chain(&["a1", "a2"], vec![Filter::Concat { inputs: 2 }], "a3");
    } else {
        let cut = Filter::Trim {
            start: None,
            end: Some(layout.head_end),
        };
        graph.chain(&["a"], vec![echo, fade, cut], "a3");
    }
    join(graph, "a3", "b", layout, FadeCurve::Tri);
}

/// Hard fade-out, silence, hard fade-in
fn drop_cut(graph: &mut FilterGraph, layout: &StepLayout, config: &RenderConfig) {
    graph
        .chain(
            &["a"],
            vec![Filter::FadeOut {
                start: layout.effect_start,
                duration: layout.effect_len.max(0.01),
            }],
            "a2",
        )
        .chain(
            &["b"],
            vec![Filter::FadeIn {
                start: 0.0,
                duration: DROP_FADE_IN,
            }],
            "b2",
        );
    if layout.gap > 0.0 {
        graph
            .chain(
                &[],
                vec![
                    Filter::Silence {
                        duration: layout.gap,
                        sample_rate: config.sample_rate,
                        channels: config.channels,
                    },
                    format(config),
                ],
                "gap",
            )
            .chain(
                &["a2", "gap", "b2"],
                vec![Filter::Concat { inputs: 3 }],
                OUTPUT_LABEL,
            );
    } else {
        graph.chain(&["a2", "b2"], vec![Filter::Concat { inputs: 2 }], OUTPUT_LABEL);
    }
}
