//! Launch argument construction.
//!
//! FXServer reads its configuration from `+command` directives on the command
//! line, applied in order. Later directives override earlier ones with the same
//! key, so the emitted order is part of the contract.

use fxhost_core::{ConVarValue, InstallationLayout, PathError, ServerSettings};

/// Build the ordered directive list for one launch.
///
/// Each element is one directive as FXServer would read it from a config
/// line. See [`split_directive`] for turning a directive into argv words.
pub fn build_launch_arguments(
    server: &ServerSettings,
    layout: &InstallationLayout,
    secret: &str,
) -> Result<Vec<String>, PathError> {
    let citizen_dir = layout.citizen_dir()?;
    let mut args = Vec::with_capacity(
        10 + server.resources_to_start.len() + server.custom_args.len(),
    );

    args.push(format!("+set citizen_dir \"{}\"", citizen_dir.display()));

    if !server.announce_server {
        args.push("+set sv_master \"\"".to_string());
    }

    args.extend(server.convars().into_iter().map(|var| {
        let value = match var.value {
            ConVarValue::Bool(true) => "1".to_string(),
            ConVarValue::Bool(false) => "0".to_string(),
            ConVarValue::Int(n) => n.to_string(),
            ConVarValue::Str(s) => format!("\"{s}\""),
        };
        format!("+set {} {value}", var.key)
    }));

    if server.endpoint_privacy {
        args.push("+set sv_endpointprivacy true".to_string());
    }

    args.push(format!("+set rcon_password {secret}"));

    args.extend(
        server
            .resources_to_start
            .iter()
            .map(|res| format!("+start {res}")),
    );
    args.extend(server.custom_args.iter().map(|arg| format!("+{arg}")));

    args.push(format!("+set tags \"{}\"", server.server_tags));

    if !server.server_icon.is_empty() {
        args.push(format!("+load_server_icon \"{}\"", server.server_icon));
    }

    args.push(format!(
        "+endpoint_add_tcp \"{}:{}\"",
        server.endpoint_tcp, server.endpoint_tcp_port
    ));
    args.push(format!(
        "+endpoint_add_udp \"{}:{}\"",
        server.endpoint_udp, server.endpoint_udp_port
    ));

    Ok(args)
}

/// Split one directive into argv words.
///
/// Whitespace separates words; double quotes group and are removed. An empty
/// quoted string (`""`) yields an empty word.
pub fn split_directive(directive: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quoted = false;

    for c in directive.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                in_word = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        words.push(current);
    }

    words
}

/// Replace the secret in a rendered argument list, for display.
pub fn mask_secret(args: &[String], secret: &str) -> Vec<String> {
    args.iter()
        .map(|arg| {
            if secret.is_empty() {
                arg.clone()
            } else {
                arg.replace(secret, "********")
            }
        })
        .collect()
}
