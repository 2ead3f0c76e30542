//! The `explain` command: describe a diagnostic code.

use graft_diagnostic::ErrorCode;

/// Explanation text for `code_str`, or `None` if it is not a known code.
pub fn explain(code_str: &str) -> Option<String> {
    let code = code_str.parse::<ErrorCode>().ok()?;
    let kind = if code.is_warning() { "warning" } else { "error" };
    Some(format!("{code} ({kind})\n\n{}", code.explanation()))
}

/// Print the explanation for `code_str`, exiting with status 1 if it is unknown.
pub fn explain_error(code_str: &str) {
    let Some(text) = explain(code_str) else {
        eprintln!("Unknown error code: {code_str}");
        eprintln!();
        eprintln!("Codes have the format GXXXX (errors) or WXXXX (warnings) where X is a digit.");
        eprintln!("Examples: G1001, G2001, W1002");
        std::process::exit(1);
    };
    println!("{text}");
}
