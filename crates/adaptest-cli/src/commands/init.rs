//! The `adaptest init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("adaptest.toml").exists() {
        println!("adaptest.toml already exists, skipping.");
    } else {
        std::fs::write("adaptest.toml", SAMPLE_CONFIG)?;
        println!("Created adaptest.toml");
    }

    std::fs::create_dir_all("question-banks")?;
    let example_path = std::path::Path::new("question-banks/example.toml");
    if example_path.exists() {
        println!("question-banks/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_BANK)?;
        println!("Created question-banks/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit adaptest.toml to set the difficulty range and stopping rules");
    println!("  2. Run: adaptest validate --config adaptest.toml --bank question-banks");
    println!("  3. Run: adaptest simulate --config adaptest.toml --bank question-banks --ability 7");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# adaptest configuration

starting_level = 5
minimum_questions = 5
maximum_questions = 15
standard_error_percent = 10.0

[range]
lowest = 1
highest = 10

[scope]
category_ids = []
tag_prefixes = ["adpq_"]
"#;

const EXAMPLE_BANK: &str = r#"# Example question bank.
#
# Each question carries a difficulty tag `adpq_<level>` on the scale
# configured in adaptest.toml.

[bank]
id = "example"
name = "Example Arithmetic"
default_category = 1

[[questions]]
id = 1
name = "2 + 3"
tags = ["adpq_1"]

[[questions]]
id = 2
name = "7 - 4"
tags = ["adpq_1"]

[[questions]]
id = 3
name = "6 x 4"
tags = ["adpq_2"]

[[questions]]
id = 4
name = "18 / 3"
tags = ["adpq_2"]

[[questions]]
id = 5
name = "37 + 48"
tags = ["adpq_3"]

[[questions]]
id = 6
name = "91 - 56"
tags = ["adpq_3"]

[[questions]]
id = 7
name = "13 x 7"
tags = ["adpq_4"]

[[questions]]
id = 8
name = "144 / 12"
tags = ["adpq_4"]

[[questions]]
id = 9
name = "3/4 + 1/8"
tags = ["adpq_5"]

[[questions]]
id = 10
name = "0.6 x 0.25"
tags = ["adpq_5"]

[[questions]]
id = 11
name = "Solve 3x + 5 = 20"
tags = ["adpq_6"]

[[questions]]
id = 12
name = "15% of 240"
tags = ["adpq_6"]

[[questions]]
id = 13
name = "Solve x^2 = 49, x > 0"
tags = ["adpq_7"]

[[questions]]
id = 14
name = "Area of a circle, r = 3"
tags = ["adpq_7"]

[[questions]]
id = 15
name = "Solve 2x^2 - 8 = 0"
tags = ["adpq_8"]

[[questions]]
id = 16
name = "Slope through (1, 2) and (4, 11)"
tags = ["adpq_8"]

[[questions]]
id = 17
name = "Sum of 1..100"
tags = ["adpq_9"]

[[questions]]
id = 18
name = "log2(1024)"
tags = ["adpq_9"]

[[questions]]
id = 19
name = "Derivative of x^3"
tags = ["adpq_10"]

[[questions]]
id = 20
name = "Integral of 2x from 0 to 3"
tags = ["adpq_10"]
"#;
