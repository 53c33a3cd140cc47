use crossterm::style::{Color, Stylize};
use rand::seq::SliceRandom;

use super::Tunnel;
use crate::client::interceptor::SERVER_MIN_VERSION;

const BANNER: &str = r"
    __       _         _
   / /  ___ | | ____ _| |  ___  ___
  / /  / _ \| |/ / _  | | / __|/ _ \
 / /__| (_) |   < (_| | |_\__ \ (_) |
 \____/\___/|_|\_\__,_|_(_)___/\___/ ";

const BANNER_COLORS: [Color; 5] = [
    Color::Magenta,
    Color::Blue,
    Color::Cyan,
    Color::Green,
    Color::Red,
];

pub(super) fn print(tunnel: &Tunnel) {
    println!("{}", render(tunnel));
}

fn render(tunnel: &Tunnel) -> String {
    let color = BANNER_COLORS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(Color::Magenta);

    let mut lines = vec![
        BANNER.with(color).to_string(),
        String::new(),
        format!(
            "{}\t{}",
            "Minimum Lokal Client".with(Color::DarkRed),
            SERVER_MIN_VERSION
        ),
    ];

    if let Ok(address) = tunnel.get_public_address() {
        lines.push(format!(
            "{}\t\thttps://{}",
            "Public Address".with(Color::DarkCyan),
            address
        ));
    }
    if let Ok(address) = tunnel.get_lan_address() {
        lines.push(format!(
            "{}\t\thttps://{}",
            "LAN Address".with(Color::DarkGreen),
            address
        ));
    }
    lines.push(String::new());

    lines.join("\n")
}
