use criterion::{criterion_group, criterion_main, Criterion};

use cal_front::{lex, parse};

/// A synthetic Table object with `field_count` fields, long enough to
/// exercise the lexer's context stack and the parser's resync paths over a
/// realistically sized export.
fn synthetic_table(field_count: usize) -> String {
    let mut source = String::from("OBJECT Table 50000 Benchmark Customer\n{\n  PROPERTIES\n  {\n");
    source.push_str("    Caption='Benchmark Customer';\n    LookupPageID=Page 21;\n  }\n  FIELDS\n  {\n");
    for i in 1..=field_count {
        source.push_str(&format!(
            "    {{ {id}   ;   ;Field{id}            ;Text[30]        ; CaptionML=[ENU=Field {id}];\n",
            id = i
        ));
        source.push_str("                                    OnValidate=BEGIN\n");
        source.push_str(&format!(
            "                                                 IF Field{id} <> '' THEN\n",
            id = i
        ));
        source.push_str("                                                   MESSAGE('changed');\n");
        source.push_str("                                               END;\n");
        source.push_str("                                    }\n");
    }
    source.push_str("  }\n  KEYS\n  {\n    {    ;No.                                     ;Clustered=Yes }\n  }\n  CODE\n  {\n    BEGIN\n    END.\n  }\n}\n");
    source
}

fn long_document(c: &mut Criterion) {
    let source = synthetic_table(400);

    let mut group = c.benchmark_group("long document");
    group.bench_function("lex", |b| {
        b.iter(|| lex(&source).unwrap());
    });
    group.bench_function("lex_and_parse", |b| {
        b.iter(|| {
            let tokens = lex(&source).unwrap();
            parse(&tokens)
        });
    });
    group.finish();
}

fn small_document(c: &mut Criterion) {
    let source = synthetic_table(5);

    let mut group = c.benchmark_group("small document");
    group.bench_function("lex_and_parse", |b| {
        b.iter(|| {
            let tokens = lex(&source).unwrap();
            parse(&tokens)
        });
    });
    group.finish();
}

criterion_group!(benches, long_document, small_document);
criterion_main!(benches);
