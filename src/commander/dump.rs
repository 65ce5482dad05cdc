//! Text dumps of wrapper nodes.

use std::io::{self, Write};

use crate::core::address::is_valid;
use crate::core::wrapper::WrapperNode;

const RULE: &str = "------";

/// Renders like C's `%#lX`: `0X` prefix and upper-case digits, bare `0` for zero.
fn alt_hex(value: u64) -> String {
    if value == 0 {
        "0".to_string()
    } else {
        format!("0X{:X}", value)
    }
}

/// Prints a node's header and one line per offset-backed field.
///
/// Each line is `[OFFSET] name :\t`, the translated text and a tab when
/// present, then `[value tag] ` for every sub-value of that field.
pub fn dump_entry_info(out: &mut dyn Write, node: Option<&WrapperNode>) -> io::Result<()> {
    let Some(node) = node else {
        return Ok(());
    };

    writeln!(out, "{}", RULE)?;
    writeln!(
        out,
        "\t[{}] size: {} fieldsCount: {}\n",
        node.name,
        alt_hex(node.size),
        node.fields_count()
    )?;

    for field in node.fields().iter().filter(|f| is_valid(f.offset)) {
        write!(out, "[{:04X}] {} :\t", field.offset, field.name)?;
        if let Some(text) = &field.translated {
            write!(out, "{}\t", text)?;
        }
        for sub in &field.values {
            write!(out, "[{} {}] ", sub.value, sub.kind.as_char())?;
        }
        writeln!(out)?;
    }

    writeln!(out, "{}", RULE)
}

/// Prints every entry of a node one level deep; grandchildren are only counted.
pub fn dump_node_info(out: &mut dyn Write, node: Option<&WrapperNode>) -> io::Result<()> {
    let Some(node) = node else {
        return Ok(());
    };

    writeln!(out, "{}", RULE)?;
    writeln!(
        out,
        "\t[{}] entriesCount: {}\n",
        node.name,
        node.entries_count()
    )?;

    for (i, entry) in node.entries().iter().enumerate() {
        writeln!(out, "Entry {}:", i)?;
        dump_entry_info(out, Some(entry))?;
        if !entry.is_leaf() {
            writeln!(out, "Have entries: {}", entry.entries_count())?;
        }
        writeln!(out)?;
    }

    writeln!(out, "{}", RULE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::address::AddrKind;
    use crate::core::wrapper::{Field, WrappedValue};

    fn render(f: impl FnOnce(&mut dyn Write) -> io::Result<()>) -> String {
        let mut out: Vec<u8> = Vec::new();
        let sink: &mut dyn Write = &mut out;
        f(sink).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_entry_skips_detached_fields() {
        let mut node = WrapperNode::new("Hdr", 0, 0x20);
        node.push_field(
            Field::detached("hidden").with_value(WrappedValue::int(1, 2), AddrKind::NotAddr),
        )
        .push_field(
            Field::new("AddressOfEntryPoint", 0x10)
                .with_value(WrappedValue::int(0x1000, 4), AddrKind::Rva),
        );

        let text = render(|out| dump_entry_info(out, Some(&node)));
        assert_eq!(
            text,
            "------\n\t[Hdr] size: 0X20 fieldsCount: 2\n\n\
             [0010] AddressOfEntryPoint :\t[00001000 v] \n\
             ------\n"
        );
    }

    #[test]
    fn test_zero_size_has_no_prefix() {
        let node = WrapperNode::new("Empty", 0, 0);
        let text = render(|out| dump_entry_info(out, Some(&node)));
        assert!(text.contains("\t[Empty] size: 0 fieldsCount: 0\n\n"));
    }

    #[test]
    fn test_entry_translation_and_per_field_sub_values() {
        let mut node = WrapperNode::new("Hdr", 0, 4);
        node.push_field(
            Field::new("Machine", 0)
                .with_value(WrappedValue::int(0x14C, 2), AddrKind::NotAddr)
                .with_translation("Intel 386"),
        )
        .push_field(
            Field::new("e_res", 2)
                .with_value(WrappedValue::int(0, 2), AddrKind::NotAddr)
                .with_value(WrappedValue::int(7, 2), AddrKind::Raw),
        );

        let text = render(|out| dump_entry_info(out, Some(&node)));
        // each field renders only its own sub-values
        assert!(text.contains("[0000] Machine :\tIntel 386\t[014C _] \n"));
        assert!(text.contains("[0002] e_res :\t[0000 _] [0007 r] \n"));
    }

    #[test]
    fn test_node_counts_grandchildren_without_expanding() {
        let mut grandchild = WrapperNode::new("Thunk", 0x300, 4);
        grandchild.push_field(
            Field::new("Ordinal", 0x300).with_value(WrappedValue::int(5, 4), AddrKind::NotAddr),
        );
        let mut child = WrapperNode::new("kernel32.dll", 0x200, 20);
        child
            .push_field(
                Field::new("NameRVA", 0x20C).with_value(WrappedValue::int(0x2100, 4), AddrKind::Rva),
            )
            .push_entry(grandchild);
        let mut root = WrapperNode::new("Imports", 0x200, 40);
        root.push_entry(child);

        let text = render(|out| dump_node_info(out, Some(&root)));
        assert!(text.starts_with("------\n\t[Imports] entriesCount: 1\n\nEntry 0:\n------\n"));
        assert!(text.contains("[020C] NameRVA :\t[00002100 v] \n"));
        assert!(text.contains("Have entries: 1\n\n------\n"));
        assert!(!text.contains("Ordinal"));
    }

    #[test]
    fn test_leaf_entries_have_no_count_line() {
        let mut root = WrapperNode::new("Root", 0, 0);
        root.push_entry(WrapperNode::new("Leaf", 0, 0));
        let text = render(|out| dump_node_info(out, Some(&root)));
        assert!(!text.contains("Have entries"));
    }

    #[test]
    fn test_absent_node_prints_nothing() {
        assert_eq!(render(|out| dump_entry_info(out, None)), "");
        assert_eq!(render(|out| dump_node_info(out, None)), "");
    }
}
