// Copyright 2025 Brian Langenberger
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Describes the attached picture in each MP3 file,
//! and with the "viu" feature enabled, also draws it
//! in the terminal
//!
//! For each file, this displays the picture's
//! MIME type, kind, description and size,
//! followed by the picture itself.
//! Files without a picture are noted as such.

use id3_codec::{options::Options, picture::AlbumArt, view_tags};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    for mp3 in std::env::args_os().skip(1) {
        let name = mp3.to_string_lossy();
        match view_tags(&mp3, &Options::default()) {
            Ok(view) => match view.album_art {
                Some(art) => {
                    describe(&name, &art);
                    if let Err(err) = draw(&art) {
                        eprintln!("* {name}: {err}");
                    }
                }
                None => println!("{name}: no attached picture"),
            },
            Err(err) => eprintln!("* {name}: {err}"),
        }
    }
}

fn describe(name: &str, art: &AlbumArt) {
    println!("{name}:");
    println!("{:>12} : {}", "MIME type", art.mime);
    match art.kind() {
        Some(kind) => println!("{:>12} : {kind}", "kind"),
        None => println!("{:>12} : undefined ({})", "kind", art.picture_type),
    }
    if !art.description.is_empty() {
        println!(
            "{:>12} : {}",
            "description",
            String::from_utf8_lossy(&art.description)
        );
    }
    println!("{:>12} : {} bytes", "size", art.data.len());
}

#[cfg(feature = "viu")]
fn draw(art: &AlbumArt) -> Result<(), Box<dyn std::error::Error>> {
    let image = image::load_from_memory(&art.data)?;
    viuer::print(
        &image,
        &viuer::Config {
            absolute_offset: false,
            width: Some(40),
            ..viuer::Config::default()
        },
    )?;
    Ok(())
}

#[cfg(not(feature = "viu"))]
fn draw(_: &AlbumArt) -> Result<(), Box<dyn std::error::Error>> {
    println!("(enable the \"viu\" feature to draw pictures)");
    Ok(())
}
