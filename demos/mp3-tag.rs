// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use id3_codec::{edit_tag, fields::Field, header::has_id3_signature, options::Options, view_tags};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Views or edits the ID3v2 tag of a single MP3 file
///
/// "mp3-tag -v <file.mp3>" displays the tag's known fields
/// and writes any cover art to the current directory,
/// while "mp3-tag -e -t <title> <file.mp3>" replaces a single field.
///
/// Set RUST_LOG=debug to see what the library is doing.

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match std::env::args().skip(1).collect::<Vec<_>>().as_slice() {
        [view, mp3] if view == "-v" => {
            if let Err(err) = check(mp3).and_then(|()| view_file(mp3)) {
                report(&err);
            }
        }
        [edit, option, value, mp3] if edit == "-e" => match field(option) {
            Some(field) => match check(mp3).and_then(|()| {
                edit_tag(mp3, field, value.as_bytes(), &Options::default())
                    .map_err(|err| err.to_string())
            }) {
                Ok(rewrite) if rewrite.replaced == 0 => {
                    report(&format!("{mp3} has no {field} frame to edit"))
                }
                Ok(_) => println!("* {mp3}: {field} updated"),
                Err(err) => report(&err),
            },
            None => {
                report(&format!("unknown tag option \"{option}\""));
                help();
            }
        },
        _ => help(),
    }
}

fn field(option: &str) -> Option<Field> {
    match option {
        "-t" => Some(Field::Title),
        "-T" => Some(Field::Track),
        "-a" => Some(Field::Artist),
        "-A" => Some(Field::Album),
        "-y" => Some(Field::Year),
        "-c" => Some(Field::Comment),
        "-g" => Some(Field::Genre),
        _ => None,
    }
}

fn check(mp3: &str) -> Result<(), String> {
    let path = Path::new(mp3);
    if !path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mp3"))
    {
        return Err("please provide an MP3 file".to_owned());
    }

    match std::fs::File::open(path).and_then(has_id3_signature) {
        Ok(true) => Ok(()),
        Ok(false) => Err(format!("{mp3} doesn't follow the ID3v2 standard")),
        Err(err) => Err(format!("{mp3}: {err}")),
    }
}

fn view_file(mp3: &str) -> Result<(), String> {
    let view = view_tags(mp3, &Options::default().artwork_dir("."))
        .map_err(|err| format!("{mp3}: {err}"))?;

    println!(
        "ID3v2.{}.{} tag, {} bytes",
        view.header.version_major, view.header.version_minor, view.header.size
    );
    for field in Field::ALL {
        println!(
            "{:>8} : {}",
            field.to_string(),
            view.record
                .get(field)
                .map(String::from_utf8_lossy)
                .unwrap_or_default()
        );
    }
    if let Some(path) = view.album_art_path {
        println!("{:>8} : {}", "Artwork", path.display());
    }
    for anomaly in &view.anomalies {
        report(&anomaly.to_string());
    }
    Ok(())
}

fn report(err: &str) {
    eprintln!("\x1b[31m* Error: {err}\x1b[0m");
}

fn help() {
    eprintln!("Usage: mp3-tag -v <file.mp3>");
    eprintln!("       mp3-tag -e <option> <value> <file.mp3>");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -v    view song info");
    eprintln!("  -e    edit a tag field");
    eprintln!("  -h    display this help");
    eprintln!();
    eprintln!("Edit options:");
    eprintln!("  -t    title");
    eprintln!("  -T    track");
    eprintln!("  -a    artist");
    eprintln!("  -A    album");
    eprintln!("  -y    year");
    eprintln!("  -c    comment");
    eprintln!("  -g    genre");
}
