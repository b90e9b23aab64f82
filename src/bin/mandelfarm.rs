use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant};

use clap::{App, Arg, ArgMatches};
use image::ColorType;
use log::info;
use num::{clamp, Complex};

use mandelfarm::{RenderParams, Strategy};

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    match parse_pair(s, ',') {
        Some((re, im)) => Some(Complex { re, im }),
        None => None,
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + PartialOrd>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const LEFTLOWER: &str = "leftlower";
const RIGHTUPPER: &str = "rightupper";
const WORKERS: &str = "workers";
const STRATEGY: &str = "strategy";
const ITERATIONS: &str = "iterations";
const RADIUS: &str = "escape-radius";
const NO_SMOOTH: &str = "no-smooth";
const TIMEOUT: &str = "timeout";

fn args<'a>() -> ArgMatches<'a> {
    App::new("mandelfarm")
        .version("0.1.0")
        .about("Mandelbrot renderer that farms rows out to a fixed set of workers")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file; the extension picks the image format"),
        )
        .arg(
            Arg::with_name(SIZE)
                .required(false)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("1024x1024")
                .validator(|s| validate_pair::<usize>(&s, 'x', "Could not parse output image size"))
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(LEFTLOWER)
                .required(false)
                .long(LEFTLOWER)
                .short("l")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-2,-1.125")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse left lower corner"))
                .help("Left lower corner of the mandelbrot space"),
        )
        .arg(
            Arg::with_name(RIGHTUPPER)
                .required(false)
                .long(RIGHTUPPER)
                .short("r")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("1,1.125")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse right upper corner"))
                .help("Right upper corner of the mandelbrot space"),
        )
        .arg(
            Arg::with_name(WORKERS)
                .required(false)
                .long(WORKERS)
                .short("w")
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        1024,
                        "Could not parse worker count",
                        "Worker count must be between 1 and 1024",
                    )
                })
                .help("Number of ranks, coordinator included [default: one per CPU]"),
        )
        .arg(
            Arg::with_name(STRATEGY)
                .required(false)
                .long(STRATEGY)
                .short("p")
                .takes_value(true)
                .possible_values(&["block", "cyclic", "dynamic"])
                .default_value("dynamic")
                .help("How rows are distributed between ranks"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .required(false)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("50")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        1_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 1000000",
                    )
                })
                .help("Maximum number of iterations per point"),
        )
        .arg(
            Arg::with_name(RADIUS)
                .required(false)
                .long(RADIUS)
                .short("e")
                .takes_value(true)
                .default_value("10")
                .validator(|s| {
                    validate_range(
                        &s,
                        1.000_001,
                        1.0e150,
                        "Could not parse escape radius",
                        "Escape radius must be above 1",
                    )
                })
                .help("Magnitude past which a point counts as escaped"),
        )
        .arg(
            Arg::with_name(NO_SMOOTH)
                .long(NO_SMOOTH)
                .help("Use integer escape times instead of smoothed ones"),
        )
        .arg(
            Arg::with_name(TIMEOUT)
                .required(false)
                .long(TIMEOUT)
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        86_400,
                        "Could not parse timeout",
                        "Timeout must be between 1 and 86400 seconds",
                    )
                })
                .help("Fail instead of waiting more than this many seconds on a silent rank"),
        )
        .get_matches()
}

fn params(matches: &ArgMatches) -> Result<RenderParams, failure::Error> {
    let (width, height) = parse_pair(matches.value_of(SIZE).unwrap_or_default(), 'x')
        .ok_or_else(|| failure::err_msg("Error parsing image dimensions"))?;
    let leftlower = parse_complex(matches.value_of(LEFTLOWER).unwrap_or_default())
        .ok_or_else(|| failure::err_msg("Error parsing left lower point"))?;
    let rightupper = parse_complex(matches.value_of(RIGHTUPPER).unwrap_or_default())
        .ok_or_else(|| failure::err_msg("Error parsing right upper point"))?;

    let mut params = RenderParams::from_corners(width, height, leftlower, rightupper)?;
    if let Some(workers) = matches.value_of(WORKERS) {
        params.workers = usize::from_str(workers)?;
    }
    params.strategy = Strategy::from_str(matches.value_of(STRATEGY).unwrap_or("dynamic"))?;
    params.max_iterations = usize::from_str(matches.value_of(ITERATIONS).unwrap_or("50"))?;
    params.escape_radius = f64::from_str(matches.value_of(RADIUS).unwrap_or("10"))?;
    params.smooth = !matches.is_present(NO_SMOOTH);
    if let Some(timeout) = matches.value_of(TIMEOUT) {
        params.recv_timeout = Some(Duration::from_secs(u64::from_str(timeout)?));
    }
    Ok(params)
}

fn write_image(outfile: &str, pixels: &[u8], bounds: (usize, usize)) -> Result<(), failure::Error> {
    image::save_buffer(
        Path::new(outfile),
        pixels,
        bounds.0 as u32,
        bounds.1 as u32,
        ColorType::Gray(8),
    )?;
    Ok(())
}

fn run(matches: &ArgMatches) -> Result<(), failure::Error> {
    let params = params(matches)?;
    let started = Instant::now();
    let render = mandelfarm::render(&params)?;
    info!("rendered in {:?}", started.elapsed());

    let pixels: Vec<u8> = render
        .grid
        .as_slice()
        .iter()
        .map(|v| (clamp(*v, 0.0, 1.0) * 255.0) as u8)
        .collect();
    write_image(
        matches.value_of(OUTPUT).unwrap_or_default(),
        &pixels,
        (render.grid.width(), render.grid.height()),
    )
}

fn main() {
    env_logger::init();
    let matches = args();
    if let Err(e) = run(&matches) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
