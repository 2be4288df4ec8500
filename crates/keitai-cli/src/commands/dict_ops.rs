use std::fs;
use std::path::Path;
use std::process;

use keitai_core::dict::{DictionaryBuilder, RecordDictionary};
use keitai_core::Dictionaries;

fn open(dict_path: &str) -> Dictionaries {
    die!(
        Dictionaries::open_path(Path::new(dict_path)),
        "Error opening dictionary {dict_path}: {}"
    )
}

pub fn build(src_dir: &str, output: &str, bundle: bool) {
    let src = Path::new(src_dir);
    if !src.is_dir() {
        eprintln!("Error: {src_dir} is not a directory");
        process::exit(1);
    }

    eprintln!("Reading sources from {src_dir}...");
    let builder = die!(
        DictionaryBuilder::from_dir(src),
        "Error reading dictionary sources: {}"
    );
    if builder.skipped_lines() > 0 {
        eprintln!("  Skipped {} malformed lines", builder.skipped_lines());
    }
    let dict = die!(builder.build(), "Error building dictionary: {}");

    let out = Path::new(output);
    if bundle {
        die!(dict.save(out), "Error writing {output}: {}");
        let file_size = fs::metadata(out).map(|m| m.len()).unwrap_or(0);
        eprintln!(
            "Wrote {output} ({:.1} MB)",
            file_size as f64 / 1_048_576.0
        );
    } else {
        die!(dict.save_dir(out), "Error writing {output}: {}");
        eprintln!("Wrote dictionary files to {output}");
    }
}

pub fn info(dict_path: &str) {
    let dict = open(dict_path);
    let ti = dict.token_info();
    let unk = dict.unknown();
    let conn = dict.connection();

    println!("Dictionary:   {dict_path}");
    println!("Trie size:    {}", dict.trie().size());
    println!("Words:        {}", ti.store().len());
    println!("Surfaces:     {}", ti.targets().len());
    println!("Unknown:      {}", unk.store().len());
    println!(
        "Connection:   {}x{}",
        conn.forward_dimension(),
        conn.backward_dimension()
    );
    println!();
    println!("Character classes:");
    for class in unk.char_def().classes() {
        println!(
            "  {:>2} {:<14} invoke={} group={} length={} entries={}",
            class.id,
            class.name,
            u8::from(class.is_always_invoke),
            u8::from(class.is_grouping),
            class.max_length,
            unk.token_info_ids(class.id).len()
        );
    }
}

pub fn lookup(dict_path: &str, surface: &str) {
    let dict = open(dict_path);
    let Some(trie_id) = dict.trie().lookup(surface) else {
        println!("{surface} → (not found)");
        return;
    };
    println!("{surface} (trie id {trie_id}):");
    for &id in dict.token_info().token_info_ids(trie_id) {
        let p = dict.token_info().word_param(id);
        println!(
            "  #{id} left={} right={} cost={}  {}",
            p.left_id,
            p.right_id,
            p.cost,
            dict.token_info().features(id)
        );
    }
}

pub fn prefix(dict_path: &str, text: &str) {
    let dict = open(dict_path);
    let matches = dict.trie().common_prefix_search(text);
    if matches.is_empty() {
        println!("(no matches)");
        return;
    }
    for m in matches {
        let n = dict.token_info().token_info_ids(m.value).len();
        println!("  {} (trie id {}, {n} entries)", m.key, m.value);
    }
}

pub fn conn_cost(dict_path: &str, right_id: i16, left_id: i16) {
    let dict = open(dict_path);
    let cost = dict.connection().cost_between(right_id, left_id);
    println!("cost({right_id} → {left_id}) = {cost}");
}

pub fn char_class(dict_path: &str, text: &str) {
    let dict = open(dict_path);
    let char_def = dict.unknown().char_def();
    for c in text.chars() {
        let class = char_def.lookup(c);
        let compat: Vec<&str> = char_def
            .lookup_compatible(c)
            .into_iter()
            .map(|cls| cls.name.as_str())
            .collect();
        println!(
            "U+{:04X} {c}  {}  compatible: {}",
            c as u32,
            class.name,
            compat.join(", ")
        );
    }
}
