//! Sample Robot Framework test suite and resource file

use crate::project::{ProjectDescriptor, ResolvedLibrary, WebDriver};

/// Cell separator in Robot Framework's space-separated format
const SEP: &str = "    ";

fn library_import(lib: &ResolvedLibrary) -> String {
    let mut line = format!("Library{}{}", SEP, lib.import_name);
    for (name, value) in &lib.parameters {
        line.push_str(SEP);
        line.push_str(name);
        line.push('=');
        line.push_str(value);
    }
    line
}

fn suite_variable(driver: WebDriver) -> &'static str {
    if driver.is_web() {
        "${URL}    https://robotframework.org"
    } else {
        "${EXAMPLE_VAR}    example value"
    }
}

fn test_steps(driver: WebDriver) -> &'static [&'static str] {
    match driver {
        WebDriver::Selenium => &["Open Browser    ${URL}    chrome", "Title Should Be    Robot Framework"],
        WebDriver::Browser => &[
            "New Browser    chromium    headless=False",
            "New Page    ${URL}",
            "Get Title    ==    Robot Framework",
        ],
        WebDriver::None => &["Common Keyword", "Should Be Equal    1    1"],
    }
}

/// `tests/example_test.robot`
pub fn render_sample_test(project: &ProjectDescriptor) -> String {
    let driver = project.web_driver();

    let mut out = String::from(
        "*** Settings ***\n\
         Documentation    Example test suite\n\
         Resource    ../resources/common.resource\n",
    );
    for lib in &project.libraries {
        out.push_str(&library_import(lib));
        out.push('\n');
    }

    out.push_str("\n*** Variables ***\n");
    out.push_str(suite_variable(driver));
    out.push('\n');

    out.push_str(
        "\n*** Test Cases ***\n\
         Example Test\n    \
         [Documentation]    Example test case\n    \
         [Tags]    example\n    \
         Log    Running example test\n",
    );
    for step in test_steps(driver) {
        out.push_str(SEP);
        out.push_str(step);
        out.push('\n');
    }

    out
}

/// `resources/common.resource`
pub fn render_sample_resource(project: &ProjectDescriptor) -> String {
    let variable = if project.web_driver().is_web() {
        "${TIMEOUT}    20s"
    } else {
        "${COMMON_VAR}    common value"
    };

    format!(
        "*** Settings ***\n\
         Documentation    Common keywords and variables\n\
         \n\
         *** Variables ***\n\
         {}\n\
         \n\
         *** Keywords ***\n\
         Common Keyword\n    \
         [Documentation]    Example of a common keyword\n    \
         Log    This is a common keyword\n",
        variable
    )
}
