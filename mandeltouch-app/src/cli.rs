//! Command-line options for the headless `mandeltouch` binary.
//!
//! Replayed inputs (`--tap`, `--wheel`, `--reset`, ...) may repeat and are
//! applied in the order they appear on the command line.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};

use mandeltouch_core::{AspectRatio, Complex, Resolution};

use crate::gesture::{TouchEvent, TouchKind};

/// An input replayed against the session before the frame is exported.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Touch(TouchEvent),
    Wheel { x: f64, y: f64, delta_y: f64 },
    CycleColors(i64),
    Reset,
}

/// Render one MandelTouch view to a PNG and print its encoded state.
#[derive(Parser, Debug)]
#[command(name = "mandeltouch", version, about)]
struct Args {
    /// Encoded view state (base64 or JSON)
    #[arg(long)]
    state: Option<String>,

    /// Output file, or a directory to write a generated file name into
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Aspect ratio: 16x9, 16x10, 48x10, or any WxH
    #[arg(long, default_value = "16x10")]
    aspect: AspectRatio,

    /// Output size: xs, s, m, l, xl
    #[arg(long, default_value = "s")]
    resolution: Resolution,

    /// Built-in color map: grayscale, fire, rainbow, flame
    #[arg(long = "colors")]
    color_map: Option<String>,

    /// Render the Julia set for RE + IMi
    #[arg(long, value_name = "RE,IM", value_parser = parse_pair, allow_hyphen_values = true)]
    julia: Option<(f64, f64)>,

    /// Pan to a pixel
    #[arg(long, value_name = "X,Y", value_parser = parse_pair, allow_hyphen_values = true)]
    tap: Vec<(f64, f64)>,

    /// Zoom in at a pixel
    #[arg(long, value_name = "X,Y", value_parser = parse_pair, allow_hyphen_values = true)]
    double_tap: Vec<(f64, f64)>,

    /// Zoom out at a pixel
    #[arg(long, value_name = "X,Y", value_parser = parse_pair, allow_hyphen_values = true)]
    long_tap: Vec<(f64, f64)>,

    /// Wheel zoom at a pixel (DY < 0 zooms in)
    #[arg(long, value_name = "X,Y,DY", value_parser = parse_wheel, allow_hyphen_values = true)]
    wheel: Vec<(f64, f64, f64)>,

    /// Shift colors by N table entries
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    cycle: Vec<i64>,

    /// Restore the default view
    #[arg(long, action = clap::ArgAction::Count)]
    reset: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CliOptions {
    pub state: Option<String>,
    pub output: PathBuf,
    pub aspect: AspectRatio,
    pub resolution: Resolution,
    pub color_map: Option<String>,
    pub julia: Option<Complex>,
    pub actions: Vec<Action>,
}

impl CliOptions {
    /// Parse the process arguments, exiting with usage on error or `--help`.
    pub fn parse() -> Self {
        Self::try_parse_from(std::env::args_os()).unwrap_or_else(|e| e.exit())
    }

    /// Parse `args`, where the first item is the program name.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Args::command().try_get_matches_from(args)?;
        let args = Args::from_arg_matches(&matches)?;
        let actions = ordered_actions(&matches, &args);
        Ok(Self {
            state: args.state,
            output: args.out,
            aspect: args.aspect,
            resolution: args.resolution,
            color_map: args.color_map,
            julia: args.julia.map(|(re, im)| Complex::new(re, im)),
            actions,
        })
    }
}

/// Interleave the replayed inputs by their position on the command line.
fn ordered_actions(matches: &ArgMatches, args: &Args) -> Vec<Action> {
    let mut indexed: Vec<(usize, Action)> = Vec::new();
    let mut collect = |id: &str, actions: Vec<Action>| {
        if let Some(indices) = matches.indices_of(id) {
            indexed.extend(indices.zip(actions));
        }
    };

    let touches = |kind: TouchKind, points: &[(f64, f64)]| -> Vec<Action> {
        points
            .iter()
            .map(|&(x, y)| Action::Touch(TouchEvent { kind, x, y }))
            .collect()
    };
    collect("tap", touches(TouchKind::SingleTap, &args.tap));
    collect("double_tap", touches(TouchKind::DoubleTap, &args.double_tap));
    collect("long_tap", touches(TouchKind::LongTap, &args.long_tap));
    collect(
        "wheel",
        args.wheel
            .iter()
            .map(|&(x, y, delta_y)| Action::Wheel { x, y, delta_y })
            .collect(),
    );
    collect(
        "cycle",
        args.cycle.iter().copied().map(Action::CycleColors).collect(),
    );
    collect("reset", vec![Action::Reset; args.reset as usize]);

    indexed.sort_by_key(|&(index, _)| index);
    indexed.into_iter().map(|(_, action)| action).collect()
}

/// Comma-separated finite numbers, exactly `n` of them.
fn finite_numbers(value: &str, n: usize) -> Result<Vec<f64>, String> {
    let parsed = value
        .split(',')
        .map(|part| part.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| format!("expected {n} comma-separated numbers"))?;
    if parsed.len() != n {
        return Err(format!("expected {n} comma-separated numbers, got {}", parsed.len()));
    }
    Ok(parsed)
}

fn parse_pair(value: &str) -> Result<(f64, f64), String> {
    let v = finite_numbers(value, 2)?;
    Ok((v[0], v[1]))
}

fn parse_wheel(value: &str) -> Result<(f64, f64, f64), String> {
    let v = finite_numbers(value, 3)?;
    Ok((v[0], v[1], v[2]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<CliOptions, clap::Error> {
        CliOptions::try_parse_from(std::iter::once("mandeltouch").chain(args.iter().copied()))
    }

    #[test]
    fn definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults_without_arguments() {
        let opts = parse(&[]).unwrap();
        assert_eq!(opts.state, None);
        assert_eq!(opts.output, PathBuf::from("."));
        assert_eq!(opts.aspect, AspectRatio::SIXTEEN_TEN);
        assert_eq!(opts.resolution, Resolution::S);
        assert_eq!(opts.julia, None);
        assert!(opts.actions.is_empty());
    }

    #[test]
    fn parses_options_and_actions_in_order() {
        let opts = parse(&[
            "--aspect", "16x9", "--resolution", "xs", "--colors", "fire", "--double-tap", "10,20",
            "--wheel", "5,5,-1", "--reset", "--cycle", "-3", "--julia", "-0.4, 0.6", "--tap",
            "1,2", "--reset",
        ])
        .unwrap();
        assert_eq!(opts.aspect, AspectRatio::SIXTEEN_NINE);
        assert_eq!(opts.resolution, Resolution::Xs);
        assert_eq!(opts.color_map.as_deref(), Some("fire"));
        assert_eq!(opts.julia, Some(Complex::new(-0.4, 0.6)));
        assert_eq!(
            opts.actions,
            vec![
                Action::Touch(TouchEvent {
                    kind: TouchKind::DoubleTap,
                    x: 10.0,
                    y: 20.0
                }),
                Action::Wheel {
                    x: 5.0,
                    y: 5.0,
                    delta_y: -1.0
                },
                Action::Reset,
                Action::CycleColors(-3),
                Action::Touch(TouchEvent {
                    kind: TouchKind::SingleTap,
                    x: 1.0,
                    y: 2.0
                }),
                Action::Reset,
            ]
        );
    }

    #[test]
    fn rejects_bad_input() {
        let kind = |args: &[&str]| parse(args).map(|_| ()).unwrap_err().kind();
        assert_eq!(kind(&["--bogus", "1"]), ErrorKind::UnknownArgument);
        assert_eq!(kind(&["--tap"]), ErrorKind::InvalidValue);
        assert_eq!(kind(&["--tap", "1,2,3"]), ErrorKind::ValueValidation);
        assert_eq!(kind(&["--wheel", "1,x,3"]), ErrorKind::ValueValidation);
        assert_eq!(kind(&["--julia", "nan,0"]), ErrorKind::ValueValidation);
        assert_eq!(kind(&["--resolution", "huge"]), ErrorKind::ValueValidation);
        assert_eq!(kind(&["--aspect", "16x0"]), ErrorKind::ValueValidation);
    }

    #[test]
    fn parse_helpers() {
        assert_eq!(parse_pair(" 3 , -4.5"), Ok((3.0, -4.5)));
        assert!(parse_pair("1").is_err());
        assert_eq!(parse_wheel("0,0,120"), Ok((0.0, 0.0, 120.0)));
        assert!(parse_wheel("0,0,inf").is_err());
    }
}
