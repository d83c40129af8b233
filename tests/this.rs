#[macro_use]
mod common;

#[cfg(test)]
mod this {
    tests! {
        refers_to_instance in this is OK
        "Egotist instance"
    }

    tests! {
        in_closure in this is OK
        "tagged"
    }

    tests! {
        at_top_level in this is ERR(65)
        "[line 1:7] Error at 'this': Cannot use 'this' outside of a class"
    }

    tests! {
        in_function in this is ERR(65)
        "[line 2:9] Error at 'this': Cannot use 'this' outside of a class"
    }
}
