//! README rendering

use crate::project::{DependencyManager, ProjectDescriptor};

const FALLBACK_DESCRIPTION: &str = "A Robot Framework project.";

fn install_instructions(manager: DependencyManager) -> &'static str {
    match manager {
        DependencyManager::Venv => {
            "1. Create a virtual environment:
   ```
   python -m venv venv
   ```

2. Activate the virtual environment:
   - Windows: `venv\\Scripts\\activate`
   - Unix/MacOS: `source venv/bin/activate`

3. Install dependencies:
   ```
   pip install -r requirements.txt
   ```"
        }
        DependencyManager::Uv => {
            "1. Install uv:
   ```
   curl -LsSf https://astral.sh/uv/install.sh | sh
   ```

2. Create virtual environment and install dependencies:
   ```
   uv venv
   uv pip install -r requirements.txt
   ```"
        }
        DependencyManager::Poetry => {
            "1. Install Poetry:
   ```
   curl -sSL https://install.python-poetry.org | python3 -
   ```

2. Install dependencies:
   ```
   poetry install
   ```"
        }
        DependencyManager::Pdm => {
            "1. Install PDM:
   ```
   curl -sSL https://pdm-project.org/install-pdm.py | python3 -
   ```

2. Install dependencies:
   ```
   pdm install
   ```"
        }
    }
}

pub fn render_readme(project: &ProjectDescriptor) -> String {
    let description = if project.description.trim().is_empty() {
        FALLBACK_DESCRIPTION
    } else {
        project.description.as_str()
    };

    let dependencies = if project.libraries.is_empty() {
        "No libraries selected.".to_string()
    } else {
        project
            .libraries
            .iter()
            .map(|lib| format!("- {}", lib.name))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "# {name}

{description}

## Project Setup

This project was generated using Robot Framework Initializer.

### Requirements

- Python {python}
- Robot Framework {robot}

### Dependencies

{dependencies}

## Getting Started

{install}

## Running Tests

```
robot -d results tests/
```

## Project Structure

- `tests/`: Contains test suite files
- `resources/`: Contains resource files and keywords
- `results/`: Test execution results
",
        name = project.name,
        description = description,
        python = project.python_version,
        robot = project.robot_framework_version,
        dependencies = dependencies,
        install = install_instructions(project.manager),
    )
}
