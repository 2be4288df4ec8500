use std::fs;

pub fn settings_export() {
    print!("{}", keitai_core::settings::default_toml());
}

pub fn settings_validate(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let s = die!(
        keitai_core::settings::parse_settings_toml(&content),
        "Error: {}"
    );
    println!(
        "OK: tokenizer.sentence_delimiters={:?}, unknown.cap_group_at_max_length={}",
        s.tokenizer.sentence_delimiters, s.unknown.cap_group_at_max_length
    );
}
