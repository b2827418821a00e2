//! C declarations and comments

use crate::types::{Binding, IgnoreHandling, Parameter, Variable};

/// Declarator of a binding: `const int* name[3]`.
pub fn declaration(binding: &Binding) -> String {
    let mut decl = String::new();
    if binding.is_const {
        decl.push_str("const ");
    }
    decl.push_str(&binding.ty);
    decl.push_str(&"*".repeat(binding.pointer as usize));
    decl.push(' ');
    decl.push_str(&binding.name);
    for dim in &binding.dims {
        decl.push_str(&format!("[{dim}]"));
    }
    decl
}

/// Declaration statement of a local, with its initializer.
pub fn variable(variable: &Variable) -> String {
    match &variable.initializer {
        Some(init) => format!("{} = {init};", declaration(&variable.binding)),
        None => format!("{};", declaration(&variable.binding)),
    }
}

/// Parameter list of a prototype, `void` when empty.
pub fn parameter_list(parameters: &[Parameter]) -> String {
    if parameters.is_empty() {
        return "void".to_string();
    }
    parameters
        .iter()
        .map(|p| declaration(&p.binding))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Substitution of the "ignore" status sentinels by scratch storage.
pub fn status_ignore_init(parameter: &Parameter) -> Option<String> {
    let name = parameter.name();
    match &parameter.ignore_handling {
        IgnoreHandling::None => None,
        IgnoreHandling::Status => Some(format!(
            "if ( {name} == MPI_STATUS_IGNORE )\n{{\n    {name} = scorep_mpi_get_status_array(1);\n}}\n"
        )),
        IgnoreHandling::Statuses { length } => Some(format!(
            "if ( {name} == MPI_STATUSES_IGNORE )\n{{\n    {name} = scorep_mpi_get_status_array( {length} );\n}}\n"
        )),
    }
}

/// Block comment with one ` * ` line per input line.
pub fn comment_block(text: &str) -> String {
    let mut out = String::from("/*\n");
    for line in text.lines() {
        out.push_str(" * ");
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(" */\n");
    out
}

/// Hook trace formatter: a single-line `//` comment.
pub fn debug_comment(message: &str) -> String {
    format!("// {}\n", message.replace('\n', ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration() {
        let b = Binding::new("buf", "void").with_pointer(1).constant();
        assert_eq!(declaration(&b), "const void* buf");
        let b = Binding::new("array_of_statuses", "MPI_Status").with_dim("");
        assert_eq!(declaration(&b), "MPI_Status array_of_statuses[]");
    }

    #[test]
    fn test_variable() {
        let v = Variable::initialized(Binding::new("regionHandle", "int").constant(), "0");
        assert_eq!(variable(&v), "const int regionHandle = 0;");
        let v = Variable::new(Binding::new("local_rank", "int"));
        assert_eq!(variable(&v), "int local_rank;");
    }

    #[test]
    fn test_parameter_list() {
        assert_eq!(parameter_list(&[]), "void");
        let params = vec![
            Parameter::new(Binding::new("count", "int")),
            Parameter::new(Binding::new("comm", "MPI_Comm")),
        ];
        assert_eq!(parameter_list(&params), "int count, MPI_Comm comm");
    }

    #[test]
    fn test_comment_block_and_debug() {
        assert_eq!(comment_block("Fake finalization"), "/*\n * Fake finalization\n */\n");
        assert_eq!(debug_comment("Hook 'body' enter\n"), "// Hook 'body' enter\n");
    }
}
