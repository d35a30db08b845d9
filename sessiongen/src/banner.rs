//! Start-up banner.

/// "telegram / get session" in large block letters.
pub const BANNER: &str = r#"
888             888
888             888
888             888
888888  .d88b.  888  .d88b.   .d88b.  888d888  8888b.  88888b.d88b.
888    d8P  Y8b 888 d8P  Y8b d88P"88b 888P"       "88b 888 "888 "88b
888    88888888 888 88888888 888  888 888     .d888888 888  888  888
Y88b.  Y8b.     888 Y8b.     Y88b 888 888     888  888 888  888  888
 "Y888  "Y8888  888  "Y8888   "Y88888 888     "Y888888 888  888  888
                                  888
                             Y8b d88P
                              "Y88P"
                  888                                            d8b
                  888                                            Y8P
                  888
 .d88b.   .d88b.  888888     .d8888b   .d88b.  .d8888b  .d8888b  888  .d88b.  88888b.
d88P"88b d8P  Y8b 888        88K      d8P  Y8b 88K      88K      888 d88""88b 888 "88b
888  888 88888888 888        "Y8888b. 88888888 "Y8888b. "Y8888b. 888 888  888 888  888
Y88b 888 Y8b.     Y88b.           X88 Y8b.          X88      X88 888 Y88..88P 888  888
 "Y88888  "Y8888   "Y888      88888P'  "Y8888   88888P'  88888P' 888  "Y88P"  888  888
     888
Y8b d88P
 "Y88P"
"#;

/// Print the banner to stdout.
pub fn print() {
    println!("{BANNER}");
}
