#[macro_use]
mod common;

#[cfg(test)]
mod r#if {
    tests! {
        then in if is OK
        "then"
    }

    tests! {
        else_branch in if is OK
        "else"
    }

    tests! {
        dangling_else in if is OK
        "else of inner"
    }

    tests! {
        condition_expression in if is OK
        "big"
    }
}
